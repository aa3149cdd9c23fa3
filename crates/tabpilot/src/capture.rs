// Capture option types
//
// Screenshot and PDF generation share the page's exclusive capture queue;
// these are the parameter sets the queue tasks carry.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};

/// Image format for a screenshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenshotFormat {
    #[default]
    Png,
    Jpeg,
}

impl ScreenshotFormat {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            ScreenshotFormat::Png => "png",
            ScreenshotFormat::Jpeg => "jpeg",
        }
    }
}

/// Region of the page to capture
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

impl Clip {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            scale: 1.0,
        }
    }
}

/// Options for [`crate::Page::screenshot`]
#[derive(Debug, Clone, Default)]
pub struct ScreenshotOptions {
    pub format: ScreenshotFormat,
    pub quality: Option<u8>,
    pub full_page: bool,
    pub clip: Option<Clip>,
}

impl ScreenshotOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: ScreenshotFormat) -> Self {
        self.format = format;
        self
    }

    /// Compression quality, JPEG only
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Capture the full scrollable page instead of the viewport
    pub fn full_page(mut self, full_page: bool) -> Self {
        self.full_page = full_page;
        self
    }

    pub fn clip(mut self, clip: Clip) -> Self {
        self.clip = Some(clip);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(quality) = self.quality {
            if self.format != ScreenshotFormat::Jpeg {
                return Err(Error::InvalidArgument(
                    "quality is only supported for jpeg screenshots".to_string(),
                ));
            }
            if quality > 100 {
                return Err(Error::InvalidArgument(format!(
                    "quality must be between 0 and 100, got {quality}"
                )));
            }
        }
        if self.full_page && self.clip.is_some() {
            return Err(Error::InvalidArgument(
                "clip and full_page are mutually exclusive".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn to_params(&self) -> Result<Value> {
        let mut params = json!({ "format": self.format.as_str() });
        if let Some(quality) = self.quality {
            params["quality"] = json!(quality);
        }
        if let Some(clip) = &self.clip {
            params["clip"] = serde_json::to_value(clip)?;
        }
        Ok(params)
    }
}

/// Options for [`crate::Page::pdf`]. Defaults to US Letter at scale 1.
#[derive(Debug, Clone)]
pub struct PdfOptions {
    pub landscape: bool,
    pub print_background: bool,
    pub scale: f64,
    /// Paper size in inches
    pub paper_width: f64,
    pub paper_height: f64,
    /// Margins in inches
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    /// Ranges to print, e.g. "1-5, 8"; empty prints everything
    pub page_ranges: String,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            landscape: false,
            print_background: false,
            scale: 1.0,
            paper_width: 8.5,
            paper_height: 11.0,
            margin_top: 0.4,
            margin_bottom: 0.4,
            margin_left: 0.4,
            margin_right: 0.4,
            page_ranges: String::new(),
        }
    }
}

impl PdfOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn landscape(mut self, landscape: bool) -> Self {
        self.landscape = landscape;
        self
    }

    pub fn print_background(mut self, print_background: bool) -> Self {
        self.print_background = print_background;
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn paper_size(mut self, width: f64, height: f64) -> Self {
        self.paper_width = width;
        self.paper_height = height;
        self
    }

    pub fn page_ranges(mut self, ranges: impl Into<String>) -> Self {
        self.page_ranges = ranges.into();
        self
    }

    pub(crate) fn to_params(&self) -> Value {
        json!({
            "landscape": self.landscape,
            "printBackground": self.print_background,
            "scale": self.scale,
            "paperWidth": self.paper_width,
            "paperHeight": self.paper_height,
            "marginTop": self.margin_top,
            "marginBottom": self.margin_bottom,
            "marginLeft": self.margin_left,
            "marginRight": self.margin_right,
            "pageRanges": self.page_ranges,
        })
    }
}
