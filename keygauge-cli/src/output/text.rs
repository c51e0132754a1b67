//! Text output formatting with usage bars and colors.

use keygauge_core::{Sample, UsageCategory};
use keygauge_fetch::{CollectionReport, ProviderFailure};
use keygauge_providers::ProviderDescriptor;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

// Usage bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 10,
        }
    }

    /// Formats a whole collection report.
    pub fn format_report(&self, report: &CollectionReport) -> String {
        let mut lines = Vec::new();

        lines.push(self.bold("keygauge usage"));
        lines.push("─".repeat(70));

        if report.metrics.is_empty() {
            lines.push(self.dim("No metrics collected"));
        }
        for sample in report.samples() {
            lines.push(self.format_sample(&sample));
        }

        if !report.failed_providers.is_empty() {
            lines.push(String::new());
            lines.push(self.bold("Failed providers"));
            for failure in &report.failed_providers {
                lines.push(self.format_provider_failure(failure));
            }
        }

        lines.push(String::new());
        lines.push(self.dim(&format!(
            "{} ok, {} failed key(s), {} failed provider(s) in {:.1}s",
            report.success_count(),
            report.failure_count(),
            report.failed_providers.len(),
            report.duration.as_secs_f64()
        )));

        lines.join("\n")
    }

    /// Formats one metric line.
    pub fn format_sample(&self, sample: &Sample<'_>) -> String {
        let metric = sample.metric;
        let head = format!(
            "{:<15} {:<20}",
            metric.provider.display_name(),
            metric.key_label()
        );

        if !metric.is_success() {
            let reason = metric.error().unwrap_or("failed");
            return format!("{head} {}", self.red(&format!("✗ {reason}")));
        }

        let values = sample.values;
        let body = match (sample.category, values.ratio) {
            (UsageCategory::MonthlyCredits, Some(ratio)) => format!(
                "{} {}/{} ({})",
                self.usage_bar(ratio),
                format_number(metric.usage),
                format_number(metric.limit),
                self.color_for_ratio(ratio, &format!("{:.1}% used", ratio * 100.0))
            ),
            (UsageCategory::MonthlyCredits, None) => format!(
                "{} used, limit unknown",
                format_number(metric.usage)
            ),
            (UsageCategory::LongPeriodPackage, _) => {
                format!("{} remaining", format_signed(values.remaining))
            }
        };

        if metric.is_derived() {
            format!("{head} {body} {}", self.dim("(estimated)"))
        } else {
            format!("{head} {body}")
        }
    }

    /// Formats a provider that produced no metrics.
    pub fn format_provider_failure(&self, failure: &ProviderFailure) -> String {
        let class = failure
            .class
            .map_or_else(|| "panic".to_string(), |class| class.to_string());
        format!(
            "  {:<15} {} {}",
            failure.provider.display_name(),
            self.red(&format!("[{class}]")),
            failure.error
        )
    }

    /// Formats a usage bar; filled cells track the used share.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn usage_bar(&self, ratio: f64) -> String {
        let filled = (ratio.clamp(0.0, 1.0) * self.bar_width as f64).round() as usize;
        let empty = self.bar_width.saturating_sub(filled);

        let bar = format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(empty)
        );

        self.color_for_ratio(ratio, &bar)
    }

    /// Formats provider list header.
    pub fn format_providers_header(&self) -> String {
        format!(
            "{:<15} {:<15} {:<20} {:<20} {}",
            self.bold("Provider"),
            self.bold("Id"),
            self.bold("Category"),
            self.bold("Limit"),
            self.bold("Credential")
        )
    }

    /// Formats a single provider line.
    pub fn format_provider_line(&self, desc: &ProviderDescriptor) -> String {
        let strategy = if desc.limit_strategy().is_derived() {
            self.yellow(desc.limit_strategy().as_str())
        } else {
            self.green(desc.limit_strategy().as_str())
        };

        format!(
            "{:<15} {:<15} {:<20} {:<20} {}",
            desc.display_name(),
            desc.id.id(),
            desc.category().as_str(),
            strategy,
            desc.metadata.credential_hint
        )
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn color_for_ratio(&self, ratio: f64, text: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }

        if ratio >= 0.9 {
            self.red(text)
        } else if ratio >= 0.7 {
            self.yellow(text)
        } else {
            self.green(text)
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }
}

/// Groups digits by thousands: `1234567` -> `1,234,567`.
fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn format_signed(n: i64) -> String {
    if n < 0 {
        format!("-{}", format_number(n.unsigned_abs()))
    } else {
        format_number(n.unsigned_abs())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_bar_bounds() {
        let formatter = TextFormatter::new(false);
        assert_eq!(formatter.usage_bar(0.0), "░░░░░░░░░░");
        assert_eq!(formatter.usage_bar(1.0), "██████████");
        assert_eq!(formatter.usage_bar(1.7), "██████████");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
        assert_eq!(format_signed(-12_500), "-12,500");
    }

    #[test]
    fn test_color_for_ratio() {
        let formatter = TextFormatter::new(true);
        assert!(formatter.color_for_ratio(0.95, "x").contains(RED));
        assert!(formatter.color_for_ratio(0.75, "x").contains(YELLOW));
        assert!(formatter.color_for_ratio(0.10, "x").contains(GREEN));
    }
}
