use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{DeployError, DeployResult};

/// Single unauthenticated GET against a URL.
pub trait HttpProbe {
    /// Status code of the response, or `None` when no response was
    /// received at all.
    fn status(&self, url: &str) -> Option<u16>;
}

/// [`HttpProbe`] using a blocking reqwest client. Redirects are not
/// followed, so a `301` is reported as such.
pub struct ReqwestProbe {
    timeout: Duration,
}

impl ReqwestProbe {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ReqwestProbe {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl HttpProbe for ReqwestProbe {
    fn status(&self, url: &str) -> Option<u16> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .ok()?;

        match client.get(url).send() {
            Ok(response) => Some(response.status().as_u16()),
            Err(e) => {
                debug!("GET {url} failed: {e}");
                None
            }
        }
    }
}

/// Half-open range of accepted status codes, `[min, max)`.
///
/// # Example
///
/// ```
/// use dropship::probe::StatusRange;
///
/// let range: StatusRange = "200-400".parse().unwrap();
///
/// assert!(range.accepts(Some(301)));
/// assert!(!range.accepts(Some(404)));
/// assert!(!range.accepts(None));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRange {
    pub min: u16,
    pub max: u16,
}

impl StatusRange {
    #[must_use]
    pub const fn accepts(self, code: Option<u16>) -> bool {
        match code {
            Some(code) => code >= self.min && code < self.max,
            None => false,
        }
    }
}

impl Default for StatusRange {
    fn default() -> Self {
        Self { min: 200, max: 500 }
    }
}

impl fmt::Display for StatusRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

impl FromStr for StatusRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = s
            .split_once('-')
            .ok_or_else(|| format!("expected MIN-MAX, got '{s}'"))?;
        let min: u16 = min
            .trim()
            .parse()
            .map_err(|_| format!("invalid lower bound '{min}'"))?;
        let max: u16 = max
            .trim()
            .parse()
            .map_err(|_| format!("invalid upper bound '{max}'"))?;
        if min >= max {
            return Err(format!("empty range {min}-{max}"));
        }
        Ok(Self { min, max })
    }
}

/// Three-digit rendering of a probe result; `000` when nothing
/// answered.
#[must_use]
pub fn format_code(code: Option<u16>) -> String {
    code.map_or_else(|| "000".to_string(), |c| format!("{c:03}"))
}

/// Probe `url` once and classify the result.
pub fn check(probe: &dyn HttpProbe, url: &str, accepted: StatusRange) -> DeployResult<u16> {
    info!("Probing {url}...");
    let code = probe.status(url);
    let shown = format_code(code);

    match code {
        Some(c) if accepted.accepts(code) => {
            info!("{url} answered {shown}");
            Ok(c)
        }
        _ => Err(DeployError::UnhealthyEndpoint {
            url: url.to_string(),
            code: shown,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_bounds() {
        let range = StatusRange::default();

        assert!(range.accepts(Some(200)));
        assert!(range.accepts(Some(499)));
        assert!(!range.accepts(Some(199)));
        assert!(!range.accepts(Some(500)));
    }

    #[test]
    fn parse_rejects_bad_ranges() {
        assert!("300".parse::<StatusRange>().is_err());
        assert!("400-200".parse::<StatusRange>().is_err());
        assert!("a-b".parse::<StatusRange>().is_err());
    }

    #[test]
    fn missing_response_formats_as_zeros() {
        assert_eq!(format_code(None), "000");
        assert_eq!(format_code(Some(404)), "404");
    }
}
