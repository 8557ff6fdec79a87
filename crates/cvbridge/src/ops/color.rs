//! Colour space conversion.

use std::os::raw::c_int;

use crate::arr::Arr;
use crate::error::Result;
use crate::sys::*;

/// `CV_<src>2<dst>` conversion codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorConversion {
    Bgr2Gray,
    Rgb2Gray,
    Gray2Bgr,
    Bgr2Xyz,
    Rgb2Xyz,
    Xyz2Bgr,
    Xyz2Rgb,
    Bgr2YCrCb,
    Rgb2YCrCb,
    YCrCb2Bgr,
    YCrCb2Rgb,
    Bgr2Hsv,
    Rgb2Hsv,
    Bgr2Lab,
    Rgb2Lab,
    BayerBg2Bgr,
    BayerGb2Bgr,
    BayerRg2Bgr,
    BayerGr2Bgr,
    BayerBg2Rgb,
    BayerGb2Rgb,
    BayerRg2Rgb,
    BayerGr2Rgb,
    Bgr2Luv,
    Rgb2Luv,
    Bgr2Hls,
    Rgb2Hls,
    Hsv2Bgr,
    Hsv2Rgb,
    Lab2Bgr,
    Lab2Rgb,
    Luv2Bgr,
    Luv2Rgb,
    Hls2Bgr,
    Hls2Rgb,
}

impl ColorConversion {
    /// Native code; the Bayer-to-RGB codes alias Bayer-to-BGR codes
    pub fn raw(self) -> c_int {
        use ColorConversion::*;
        match self {
            Bgr2Gray => CV_BGR2GRAY,
            Rgb2Gray => CV_RGB2GRAY,
            Gray2Bgr => CV_GRAY2BGR,
            Bgr2Xyz => CV_BGR2XYZ,
            Rgb2Xyz => CV_RGB2XYZ,
            Xyz2Bgr => CV_XYZ2BGR,
            Xyz2Rgb => CV_XYZ2RGB,
            Bgr2YCrCb => CV_BGR2YCRCB,
            Rgb2YCrCb => CV_RGB2YCRCB,
            YCrCb2Bgr => CV_YCRCB2BGR,
            YCrCb2Rgb => CV_YCRCB2RGB,
            Bgr2Hsv => CV_BGR2HSV,
            Rgb2Hsv => CV_RGB2HSV,
            Bgr2Lab => CV_BGR2LAB,
            Rgb2Lab => CV_RGB2LAB,
            BayerBg2Bgr => CV_BAYER_BG2BGR,
            BayerGb2Bgr => CV_BAYER_GB2BGR,
            BayerRg2Bgr => CV_BAYER_RG2BGR,
            BayerGr2Bgr => CV_BAYER_GR2BGR,
            BayerBg2Rgb => CV_BAYER_BG2RGB,
            BayerGb2Rgb => CV_BAYER_GB2RGB,
            BayerRg2Rgb => CV_BAYER_RG2RGB,
            BayerGr2Rgb => CV_BAYER_GR2RGB,
            Bgr2Luv => CV_BGR2LUV,
            Rgb2Luv => CV_RGB2LUV,
            Bgr2Hls => CV_BGR2HLS,
            Rgb2Hls => CV_RGB2HLS,
            Hsv2Bgr => CV_HSV2BGR,
            Hsv2Rgb => CV_HSV2RGB,
            Lab2Bgr => CV_LAB2BGR,
            Lab2Rgb => CV_LAB2RGB,
            Luv2Bgr => CV_LUV2BGR,
            Luv2Rgb => CV_LUV2RGB,
            Hls2Bgr => CV_HLS2BGR,
            Hls2Rgb => CV_HLS2RGB,
        }
    }
}

/// `cvCvtColor`
pub fn cvt_color(src: &impl Arr, dst: &mut impl Arr, code: ColorConversion) -> Result<()> {
    let (src, dst_ptr, code) = (src.arr_ptr(), dst.arr_ptr(), code.raw());
    dst.bridge().run("cvCvtColor", move |api| unsafe {
        api.cvt_color(src.as_ptr(), dst_ptr.as_ptr(), code)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ColorConversion::Bgr2Gray.raw(), 6);
        assert_eq!(ColorConversion::Bgr2Hsv.raw(), 40);
        assert_eq!(ColorConversion::Hls2Rgb.raw(), 61);
        assert_eq!(ColorConversion::BayerBg2Rgb.raw(), ColorConversion::BayerRg2Bgr.raw());
        assert_eq!(ColorConversion::BayerGr2Rgb.raw(), 47);
    }
}
