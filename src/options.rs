use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::warn;

const BAR_BINARY: &str = "{prefix}{percent:>3}%|{wide_bar}| {binary_bytes}/{binary_total_bytes} [{elapsed}<{eta}, {binary_bytes_per_sec}]";
const BAR_DECIMAL: &str = "{prefix}{percent:>3}%|{wide_bar}| {decimal_bytes}/{decimal_total_bytes} [{elapsed}<{eta}, {decimal_bytes_per_sec}]";
const SPINNER_BINARY: &str = "{prefix}{spinner} {binary_bytes} [{elapsed}, {binary_bytes_per_sec}]";
const SPINNER_DECIMAL: &str =
    "{prefix}{spinner} {decimal_bytes} [{elapsed}, {decimal_bytes_per_sec}]";

/// Settings for the progress bar a `ProgressIO` drives.
///
/// The defaults count bytes, scale them with a divisor of 1024 and draw to
/// stderr.
#[derive(Clone)]
pub struct ProgressOptions {
    pub desc: Option<String>,
    /// Expected number of units. `None` draws a spinner instead of a bar.
    pub total: Option<u64>,
    pub unit: String,
    /// Render counts as KiB/MiB (or kB/MB) instead of raw numbers.
    pub unit_scale: bool,
    /// 1024 for binary prefixes, 1000 for decimal ones.
    pub unit_divisor: u64,
    pub initial: u64,
    /// Keep the final state on screen when the stream is closed.
    pub leave: bool,
    /// Hide the bar. The counter still advances.
    pub disable: bool,
    pub refresh_rate: u8,
    /// Overrides the style derived from the fields above.
    pub style: Option<ProgressStyle>,
}

impl Default for ProgressOptions {
    fn default() -> Self {
        Self {
            desc: None,
            total: None,
            unit: "B".to_owned(),
            unit_scale: true,
            unit_divisor: 1024,
            initial: 0,
            leave: true,
            disable: false,
            refresh_rate: 20,
            style: None,
        }
    }
}

impl ProgressOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_unit_scale(mut self, unit_scale: bool) -> Self {
        self.unit_scale = unit_scale;
        self
    }

    pub fn with_unit_divisor(mut self, unit_divisor: u64) -> Self {
        self.unit_divisor = unit_divisor;
        self
    }

    pub fn with_initial(mut self, initial: u64) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_leave(mut self, leave: bool) -> Self {
        self.leave = leave;
        self
    }

    pub fn with_disable(mut self, disable: bool) -> Self {
        self.disable = disable;
        self
    }

    pub fn with_refresh_rate(mut self, refresh_rate: u8) -> Self {
        self.refresh_rate = refresh_rate;
        self
    }

    pub fn with_style(mut self, style: ProgressStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn progress_bar(&self) -> ProgressBar {
        let target = if self.disable {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr_with_hz(self.refresh_rate.max(1))
        };

        let pb = ProgressBar::with_draw_target(self.total, target);
        pb.set_style(self.style());
        if let Some(desc) = &self.desc {
            pb.set_prefix(format!("{}: ", desc));
        }
        if self.initial > 0 {
            pb.set_position(self.initial);
        }
        pb
    }

    fn style(&self) -> ProgressStyle {
        if let Some(style) = &self.style {
            return style.clone();
        }

        let template = self.template();
        match ProgressStyle::with_template(&template) {
            Ok(style) => style,
            Err(e) => {
                warn!("invalid progress template {:?}: {}", template, e);
                if self.total.is_some() {
                    ProgressStyle::default_bar()
                } else {
                    ProgressStyle::default_spinner()
                }
            }
        }
    }

    fn template(&self) -> String {
        let bar = self.total.is_some();
        if self.unit_scale && is_byte_unit(&self.unit) {
            let decimal = self.unit_divisor == 1000;
            let t = match (bar, decimal) {
                (true, false) => BAR_BINARY,
                (true, true) => BAR_DECIMAL,
                (false, false) => SPINNER_BINARY,
                (false, true) => SPINNER_DECIMAL,
            };
            return t.to_owned();
        }

        // Braces would be read as placeholders.
        let unit: String = self.unit.chars().filter(|&c| c != '{' && c != '}').collect();
        if bar {
            format!(
                "{{prefix}}{{percent:>3}}%|{{wide_bar}}| {{pos}}/{{len}} {} [{{elapsed}}<{{eta}}, {{per_sec}}]",
                unit
            )
        } else {
            format!("{{prefix}}{{spinner}} {{pos}} {} [{{elapsed}}, {{per_sec}}]", unit)
        }
    }
}

fn is_byte_unit(unit: &str) -> bool {
    ["b", "byte", "bytes"]
        .iter()
        .any(|u| unit.eq_ignore_ascii_case(u))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let o = ProgressOptions::default();
        assert_eq!(o.unit, "B");
        assert!(o.unit_scale);
        assert_eq!(o.unit_divisor, 1024);
        assert_eq!(o.total, None);
        assert!(o.leave);
        assert!(!o.disable);
    }

    #[test]
    fn templates() {
        let o = ProgressOptions::new();
        assert_eq!(o.template(), SPINNER_BINARY);
        assert_eq!(o.clone().with_total(10).template(), BAR_BINARY);
        assert_eq!(
            o.clone().with_total(10).with_unit_divisor(1000).template(),
            BAR_DECIMAL
        );
        assert_eq!(o.clone().with_unit("bytes").template(), SPINNER_BINARY);

        let lines = o.clone().with_unit("line{s}").with_total(3).template();
        assert!(lines.contains("{pos}/{len} lines "));

        let unscaled = o.with_unit_scale(false).template();
        assert!(unscaled.contains("{pos} B "));
    }

    #[test]
    fn progress_bar_from_options() {
        let pb = ProgressOptions::new()
            .with_disable(true)
            .with_total(100)
            .with_initial(10)
            .with_desc("input")
            .progress_bar();
        assert_eq!(pb.length(), Some(100));
        assert_eq!(pb.position(), 10);
        assert_eq!(pb.prefix(), "input: ");

        let pb = ProgressOptions::new().with_disable(true).progress_bar();
        assert_eq!(pb.length(), None);
        assert_eq!(pb.position(), 0);
    }
}
