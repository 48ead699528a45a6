use std::{fs::File, io::BufReader, ops::RangeInclusive, path::Path};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::{
    core::Rgb8,
    error::{BackdropError, BackdropResult},
};

pub mod form;

pub const OUTPUT_SIZE_RANGE: RangeInclusive<u32> = 100..=2000;
pub const SCALE_PERCENT_RANGE: RangeInclusive<u32> = 25..=200;
pub const BORDER_WIDTH_RANGE: RangeInclusive<u32> = 0..=50;

/// Which variant fills the canvas behind the foreground image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    #[default]
    Color,
    Image,
}

/// Everything one render pass needs besides the source image.
///
/// Values of this type are validated: every numeric field lies inside its closed range. Build one
/// through [`RenderSettings::new`], [`RenderSettings::from_json_reader`] or the
/// [`form::SettingsForm`] boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSettings {
    pub output_width: u32,
    pub output_height: u32,
    pub scale_percent: u32,
    pub background_type: BackgroundType,
    pub background_color: Rgb8,
    pub border_width: u32,
    pub border_color: Rgb8,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            output_width: 800,
            output_height: 600,
            scale_percent: 100,
            background_type: BackgroundType::Color,
            background_color: Rgb8::WHITE,
            border_width: 0,
            border_color: Rgb8::BLACK,
        }
    }
}

impl RenderSettings {
    pub fn new(
        output_width: u32,
        output_height: u32,
        scale_percent: u32,
        background_type: BackgroundType,
        background_color: Rgb8,
        border_width: u32,
        border_color: Rgb8,
    ) -> BackdropResult<Self> {
        let s = Self {
            output_width,
            output_height,
            scale_percent,
            background_type,
            background_color,
            border_width,
            border_color,
        };
        s.validate()?;
        Ok(s)
    }

    pub fn validate(&self) -> BackdropResult<()> {
        check_range("outputWidth", self.output_width, &OUTPUT_SIZE_RANGE)?;
        check_range("outputHeight", self.output_height, &OUTPUT_SIZE_RANGE)?;
        check_range("scalePercent", self.scale_percent, &SCALE_PERCENT_RANGE)?;
        check_range("borderWidth", self.border_width, &BORDER_WIDTH_RANGE)?;
        Ok(())
    }

    /// Parse settings JSON through [`form::SettingsForm`].
    ///
    /// Absent fields take their defaults; out-of-range values are reset and logged.
    pub fn from_json_reader(r: impl std::io::Read) -> BackdropResult<Self> {
        let (form, _rejected) = form::SettingsForm::from_json_reader(r)?;
        Ok(form.settings())
    }

    pub fn from_json_file(path: &Path) -> BackdropResult<Self> {
        let f = File::open(path).with_context(|| format!("open settings '{}'", path.display()))?;
        Self::from_json_reader(BufReader::new(f))
    }
}

impl<'de> Deserialize<'de> for RenderSettings {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        RawSettings::deserialize(deserializer)?
            .into_settings()
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawSettings {
    output_width: Option<u32>,
    output_height: Option<u32>,
    scale_percent: Option<u32>,
    background_type: Option<BackgroundType>,
    background_color: Option<Rgb8>,
    border_width: Option<u32>,
    border_color: Option<Rgb8>,
}

impl RawSettings {
    fn into_settings(self) -> BackdropResult<RenderSettings> {
        let d = RenderSettings::default();
        RenderSettings::new(
            self.output_width.unwrap_or(d.output_width),
            self.output_height.unwrap_or(d.output_height),
            self.scale_percent.unwrap_or(d.scale_percent),
            self.background_type.unwrap_or(d.background_type),
            self.background_color.unwrap_or(d.background_color),
            self.border_width.unwrap_or(d.border_width),
            self.border_color.unwrap_or(d.border_color),
        )
    }
}

pub(crate) fn check_range(
    name: &str,
    value: u32,
    range: &RangeInclusive<u32>,
) -> BackdropResult<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(BackdropError::validation(format!(
            "{name} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        )))
    }
}
