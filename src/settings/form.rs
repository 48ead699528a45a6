use std::{
    fmt,
    fs::File,
    io::{BufReader, Read},
    ops::RangeInclusive,
    path::Path,
    str::FromStr,
};

use anyhow::Context as _;

use crate::{
    foundation::{
        core::Rgb8,
        error::{BackdropError, BackdropResult},
    },
    settings::{
        BORDER_WIDTH_RANGE, BackgroundType, OUTPUT_SIZE_RANGE, RenderSettings,
        SCALE_PERCENT_RANGE,
    },
};

/// One user-editable control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SettingField {
    OutputWidth,
    OutputHeight,
    ScalePercent,
    BackgroundType,
    BackgroundColor,
    BorderWidth,
    BorderColor,
}

impl SettingField {
    pub const ALL: [Self; 7] = [
        Self::OutputWidth,
        Self::OutputHeight,
        Self::ScalePercent,
        Self::BackgroundType,
        Self::BackgroundColor,
        Self::BorderWidth,
        Self::BorderColor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::OutputWidth => "outputWidth",
            Self::OutputHeight => "outputHeight",
            Self::ScalePercent => "scalePercent",
            Self::BackgroundType => "backgroundType",
            Self::BackgroundColor => "backgroundColor",
            Self::BorderWidth => "borderWidth",
            Self::BorderColor => "borderColor",
        }
    }
}

impl fmt::Display for SettingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl SettingField {
    /// Exact camelCase key as written in settings JSON.
    pub fn from_json_key(key: &str) -> BackdropResult<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == key)
            .ok_or_else(|| BackdropError::validation(format!("unknown settings key '{key}'")))
    }
}

impl FromStr for SettingField {
    type Err = BackdropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "outputwidth" | "width" => Ok(Self::OutputWidth),
            "outputheight" | "height" => Ok(Self::OutputHeight),
            "scalepercent" | "scale" => Ok(Self::ScalePercent),
            "backgroundtype" | "background" => Ok(Self::BackgroundType),
            "backgroundcolor" | "bgcolor" => Ok(Self::BackgroundColor),
            "borderwidth" | "border" => Ok(Self::BorderWidth),
            "bordercolor" => Ok(Self::BorderColor),
            _ => Err(BackdropError::validation(format!("unknown setting '{s}'"))),
        }
    }
}

/// Fields a bulk load refused, each already reset.
pub type Rejections = Vec<(SettingField, FieldUpdate)>;

/// Result of pushing one raw value through the form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldUpdate {
    Accepted,
    /// The value was refused and the field now holds `reset_to`.
    Rejected { reason: String, reset_to: String },
}

impl FieldUpdate {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Validation boundary between raw user input and [`RenderSettings`].
///
/// Holds the last accepted value of every field. A bad value never reaches the settings: the
/// field is reset to its default and the rejection is logged and returned to the caller.
#[derive(Clone, Debug, Default)]
pub struct SettingsForm {
    current: RenderSettings,
}

impl SettingsForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: RenderSettings) -> BackdropResult<Self> {
        settings.validate()?;
        Ok(Self { current: settings })
    }

    /// Build a form from settings JSON, pushing every present key through [`Self::apply`].
    ///
    /// Absent keys keep their defaults. Out-of-range or mistyped values are reset and reported in
    /// the returned list; malformed JSON and unknown keys fail the whole load.
    pub fn from_json_reader(r: impl Read) -> BackdropResult<(Self, Rejections)> {
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_reader(r)
            .map_err(|e| BackdropError::validation(format!("settings JSON: {e}")))?;

        let mut form = Self::new();
        let mut rejected = Vec::new();
        for (key, value) in raw {
            let field = SettingField::from_json_key(&key)?;
            let text = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            let update = form.apply(field, &text);
            if !update.is_accepted() {
                rejected.push((field, update));
            }
        }
        Ok((form, rejected))
    }

    pub fn from_json_file(path: &Path) -> BackdropResult<(Self, Rejections)> {
        let f = File::open(path).with_context(|| format!("open settings '{}'", path.display()))?;
        Self::from_json_reader(BufReader::new(f))
    }

    /// Snapshot of the current, fully validated settings.
    pub fn settings(&self) -> RenderSettings {
        self.current.clone()
    }

    pub fn apply(&mut self, field: SettingField, raw: &str) -> FieldUpdate {
        match self.try_apply(field, raw) {
            Ok(()) => {
                tracing::debug!(%field, value = raw, "setting accepted");
                FieldUpdate::Accepted
            }
            Err(err) => {
                let reset_to = self.reset(field);
                tracing::warn!(%field, value = raw, %reset_to, "{err}");
                FieldUpdate::Rejected {
                    reason: err.to_string(),
                    reset_to,
                }
            }
        }
    }

    /// Current value of `field` as the form would display it.
    pub fn display_value(&self, field: SettingField) -> String {
        let s = &self.current;
        match field {
            SettingField::OutputWidth => s.output_width.to_string(),
            SettingField::OutputHeight => s.output_height.to_string(),
            SettingField::ScalePercent => s.scale_percent.to_string(),
            SettingField::BackgroundType => match s.background_type {
                BackgroundType::Color => "color".to_string(),
                BackgroundType::Image => "image".to_string(),
            },
            SettingField::BackgroundColor => s.background_color.to_hex(),
            SettingField::BorderWidth => s.border_width.to_string(),
            SettingField::BorderColor => s.border_color.to_hex(),
        }
    }

    fn try_apply(&mut self, field: SettingField, raw: &str) -> BackdropResult<()> {
        let s = &mut self.current;
        match field {
            SettingField::OutputWidth => {
                s.output_width = parse_int(field, raw, &OUTPUT_SIZE_RANGE)?
            }
            SettingField::OutputHeight => {
                s.output_height = parse_int(field, raw, &OUTPUT_SIZE_RANGE)?
            }
            SettingField::ScalePercent => {
                s.scale_percent = parse_int(field, raw, &SCALE_PERCENT_RANGE)?
            }
            SettingField::BackgroundType => s.background_type = parse_background_type(raw)?,
            SettingField::BackgroundColor => s.background_color = Rgb8::parse_hex(raw)?,
            SettingField::BorderWidth => {
                s.border_width = parse_int(field, raw, &BORDER_WIDTH_RANGE)?
            }
            SettingField::BorderColor => s.border_color = Rgb8::parse_hex(raw)?,
        }
        Ok(())
    }

    fn reset(&mut self, field: SettingField) -> String {
        let d = RenderSettings::default();
        let s = &mut self.current;
        match field {
            SettingField::OutputWidth => s.output_width = d.output_width,
            SettingField::OutputHeight => s.output_height = d.output_height,
            SettingField::ScalePercent => s.scale_percent = d.scale_percent,
            SettingField::BackgroundType => s.background_type = d.background_type,
            SettingField::BackgroundColor => s.background_color = d.background_color,
            SettingField::BorderWidth => s.border_width = d.border_width,
            SettingField::BorderColor => s.border_color = d.border_color,
        }
        self.display_value(field)
    }
}

fn parse_int(field: SettingField, raw: &str, range: &RangeInclusive<u32>) -> BackdropResult<u32> {
    let v: i64 = raw.trim().parse().map_err(|_| {
        BackdropError::validation(format!("{field} must be a whole number, got '{raw}'"))
    })?;
    let v = u32::try_from(v)
        .ok()
        .filter(|v| range.contains(v))
        .ok_or_else(|| {
            BackdropError::validation(format!(
                "{field} must be between {} and {}, got {v}",
                range.start(),
                range.end()
            ))
        })?;
    Ok(v)
}

fn parse_background_type(raw: &str) -> BackdropResult<BackgroundType> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "color" | "colour" | "solid" => Ok(BackgroundType::Color),
        "image" | "blur" => Ok(BackgroundType::Image),
        _ => Err(BackdropError::validation(format!(
            "backgroundType must be 'color' or 'image', got '{raw}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_values_flow_into_settings() {
        let mut form = SettingsForm::new();
        assert!(form.apply(SettingField::OutputWidth, "1024").is_accepted());
        assert!(form.apply(SettingField::ScalePercent, " 150 ").is_accepted());
        assert!(form.apply(SettingField::BackgroundType, "Image").is_accepted());
        assert!(form.apply(SettingField::BorderColor, "#00FF00").is_accepted());

        let s = form.settings();
        assert_eq!(s.output_width, 1024);
        assert_eq!(s.scale_percent, 150);
        assert_eq!(s.background_type, BackgroundType::Image);
        assert_eq!(s.border_color, Rgb8::new(0, 255, 0));
    }

    #[test]
    fn out_of_range_resets_to_default() {
        let mut form = SettingsForm::new();
        assert!(form.apply(SettingField::OutputHeight, "1500").is_accepted());

        let update = form.apply(SettingField::OutputHeight, "2500");
        assert_eq!(
            update,
            FieldUpdate::Rejected {
                reason: "validation error: outputHeight must be between 100 and 2000, got 2500"
                    .to_string(),
                reset_to: "600".to_string(),
            }
        );
        assert_eq!(form.settings().output_height, 600);
    }

    #[test]
    fn non_integer_input_is_rejected() {
        let mut form = SettingsForm::new();
        for raw in ["12.5", "", "abc", "50px", "-5"] {
            let update = form.apply(SettingField::BorderWidth, raw);
            assert!(!update.is_accepted(), "{raw:?} should be rejected");
        }
        assert_eq!(form.settings().border_width, 0);
        form.settings().validate().unwrap();
    }

    #[test]
    fn bad_color_resets_to_default() {
        let mut form = SettingsForm::new();
        assert!(form.apply(SettingField::BackgroundColor, "#123456").is_accepted());
        let update = form.apply(SettingField::BackgroundColor, "blue-ish");
        assert!(matches!(
            update,
            FieldUpdate::Rejected { ref reset_to, .. } if reset_to == "#ffffff"
        ));
        assert_eq!(form.settings().background_color, Rgb8::WHITE);
    }

    #[test]
    fn json_out_of_range_values_are_reset_and_reported() {
        let json = r##"{"scalePercent": 300, "outputWidth": 1024, "borderWidth": -1,
            "borderColor": "#00f", "backgroundType": 3}"##;
        let (form, rejected) = SettingsForm::from_json_reader(json.as_bytes()).unwrap();

        let s = form.settings();
        assert_eq!(s.output_width, 1024);
        assert_eq!(s.scale_percent, 100);
        assert_eq!(s.border_width, 0);
        assert_eq!(s.border_color, Rgb8::new(0, 0, 255));
        assert_eq!(s.background_type, BackgroundType::Color);

        let mut fields: Vec<_> = rejected.iter().map(|(f, _)| *f).collect();
        fields.sort_by_key(|f| f.name());
        assert_eq!(
            fields,
            [
                SettingField::BackgroundType,
                SettingField::BorderWidth,
                SettingField::ScalePercent
            ]
        );
        let scale = rejected
            .iter()
            .find(|(f, _)| *f == SettingField::ScalePercent)
            .map(|(_, u)| u.clone());
        assert_eq!(
            scale,
            Some(FieldUpdate::Rejected {
                reason: "validation error: scalePercent must be between 25 and 200, got 300"
                    .to_string(),
                reset_to: "100".to_string(),
            })
        );
    }

    #[test]
    fn with_settings_requires_valid_input() {
        let bad = RenderSettings {
            border_width: 80,
            ..RenderSettings::default()
        };
        assert!(SettingsForm::with_settings(bad).is_err());
        let good = RenderSettings {
            border_width: 8,
            ..RenderSettings::default()
        };
        let form = SettingsForm::with_settings(good).unwrap();
        assert_eq!(form.display_value(SettingField::BorderWidth), "8");
    }

    #[test]
    fn json_unknown_keys_and_bad_syntax_fail() {
        assert!(SettingsForm::from_json_reader(r#"{"opacity": 1}"#.as_bytes()).is_err());
        assert!(SettingsForm::from_json_reader(r#"{"outputWidth": "#.as_bytes()).is_err());
        assert!(SettingsForm::from_json_reader("[]".as_bytes()).is_err());
        assert!(SettingField::from_json_key("border-width").is_err());
    }

    #[test]
    fn field_names_parse_loosely() {
        assert_eq!("outputWidth".parse::<SettingField>().unwrap(), SettingField::OutputWidth);
        assert_eq!("border-width".parse::<SettingField>().unwrap(), SettingField::BorderWidth);
        assert_eq!("BG_COLOR".parse::<SettingField>().unwrap(), SettingField::BackgroundColor);
        assert!("opacity".parse::<SettingField>().is_err());
        for f in SettingField::ALL {
            assert_eq!(f.name().parse::<SettingField>().unwrap(), f);
        }
    }
}
