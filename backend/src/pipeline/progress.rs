//! Best-effort download progress scraped from yt-dlp's `--newline` output.

use regex::Regex;
use std::sync::OnceLock;

fn download_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[download\]\s+(\d{1,3}(?:\.\d+)?)%").expect("static progress regex")
    })
}

/// Extracts the percentage text (`"42.3%"`) from a yt-dlp progress line.
pub fn parse_percent(line: &str) -> Option<String> {
    download_line()
        .captures(line.trim_start())
        .map(|caps| format!("{}%", &caps[1]))
}

/// Turns a stream of yt-dlp lines into progress reports, emitting at most one
/// report per whole percent so the status channel isn't flooded.
#[derive(Debug, Default)]
pub struct ProgressScraper {
    last_whole: Option<u32>,
}

impl ProgressScraper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the percentage text when `line` moves progress to a new
    /// whole percent.
    pub fn feed(&mut self, line: &str) -> Option<String> {
        let percent = parse_percent(line)?;
        let whole = percent
            .trim_end_matches('%')
            .split('.')
            .next()
            .and_then(|whole| whole.parse::<u32>().ok())?;
        if self.last_whole == Some(whole) {
            return None;
        }
        self.last_whole = Some(whole);
        Some(percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_download_lines() {
        assert_eq!(
            parse_percent("[download]  42.3% of   3.51MiB at  1.20MiB/s ETA 00:01"),
            Some("42.3%".to_string())
        );
        assert_eq!(
            parse_percent("[download] 100% of 3.51MiB in 00:00:02"),
            Some("100%".to_string())
        );
    }

    #[test]
    fn ignores_other_output() {
        assert_eq!(parse_percent("[youtube] dQw4w9WgXcQ: Downloading webpage"), None);
        assert_eq!(parse_percent("[download] Destination: tmp/abc_in.webm"), None);
        assert_eq!(parse_percent("[ExtractAudio] Destination: tmp/abc_in.wav"), None);
    }

    #[test]
    fn scraper_reports_each_whole_percent_once() {
        let mut scraper = ProgressScraper::new();
        let lines = [
            "[download]   0.1% of 10MiB",
            "[download]   0.7% of 10MiB",
            "[download]   1.0% of 10MiB",
            "[youtube] noise",
            "[download]   1.9% of 10MiB",
            "[download] 100.0% of 10MiB",
        ];
        let reports: Vec<String> = lines.iter().filter_map(|l| scraper.feed(l)).collect();
        assert_eq!(reports, vec!["0.1%", "1.0%", "100.0%"]);
    }
}
