use console::{style, StyledObject};

use uok_core::{Classification, NotifyOutcome, ProbeResult, Settlement};

const BANNER: &str = r"                    __   ___
   __  __   ____  / /__/__ \
  / / / /  / __ \/ //_// _/
 / /_/ /  / /_/ / ,<  /_/
 \__,_/   \____/_/|_| (_)
";

/// Terminal rendering of a run. Produces strings; printing is up to the caller.
#[derive(Debug, Clone, Copy)]
pub struct Presenter {
    colors: bool,
}

impl Presenter {
    pub fn new(colors: bool) -> Self {
        Self { colors }
    }

    fn styled<D>(&self, value: D) -> StyledObject<D> {
        style(value).force_styling(self.colors)
    }

    pub fn banner(&self) -> String {
        format!("{}", self.styled(BANNER).bold())
    }

    pub fn ok_line(&self, result: &ProbeResult) -> String {
        format!("{}   {}", self.styled(&result.status_text).green(), result.url)
    }

    pub fn failing_line(&self, result: &ProbeResult) -> String {
        format!(
            "{}   {}",
            self.styled(&result.status_text).red().bold().blink(),
            self.styled(&result.url).bold()
        )
    }

    /// Healthy targets first, then failing ones, each in probe order.
    pub fn report_lines(&self, classification: &Classification) -> Vec<String> {
        classification
            .ok
            .iter()
            .map(|r| self.ok_line(r))
            .chain(classification.failing.iter().map(|r| self.failing_line(r)))
            .collect()
    }

    pub fn summary(&self, classification: &Classification) -> String {
        let failing = classification.failing.len();
        let failing_text = format!("{} failing", failing);
        let failing_styled = if failing == 0 {
            self.styled(failing_text).dim()
        } else {
            self.styled(failing_text).red().bold()
        };
        format!(
            "{} {}",
            self.styled(format!("{} ok,", classification.ok.len())).green(),
            failing_styled
        )
    }

    /// One line describing the notification path, `None` in report-only mode.
    pub fn notify_line(&self, settlement: &Settlement) -> Option<String> {
        let line = match &settlement.notify {
            NotifyOutcome::Disabled => return None,
            NotifyOutcome::NothingNew => {
                format!("{}", self.styled("No new failures since the last run").dim())
            }
            NotifyOutcome::Delivered { count, first_run } => format!(
                "{} for {} {}{}",
                self.styled("Sent notification").bold(),
                count,
                if *first_run { "" } else { "new " },
                failures(*count)
            ),
            NotifyOutcome::Failed { count, reason, .. } => format!(
                "{} for {} {}: {}",
                self.styled("Notification failed").yellow().bold(),
                count,
                failures(*count),
                reason
            ),
        };
        Some(line)
    }

    /// The failures this run reported as new, one indented line each.
    pub fn new_failure_lines(&self, settlement: &Settlement) -> Vec<String> {
        settlement
            .new_failures
            .iter()
            .map(|f| format!("  {} {}", self.styled("-").red(), f.message))
            .collect()
    }
}

fn failures(count: usize) -> &'static str {
    if count == 1 {
        "failure"
    } else {
        "failures"
    }
}
