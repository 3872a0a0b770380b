pub const DEFAULT_WIDTH: u32 = 300;
pub const DEFAULT_INTERVAL: f64 = 1.0;

/// Parameters the application starts with, taken from a query string and/or flags
#[derive(Debug, Clone, PartialEq)]
pub struct StartupParams {
    pub urls: Vec<String>,
    pub width: u32,
    pub interval: f64,
    pub display_vertical: bool,
    pub hide_header: bool,
    pub hide_form: bool,
}

impl Default for StartupParams {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            width: DEFAULT_WIDTH,
            interval: DEFAULT_INTERVAL,
            display_vertical: false,
            hide_header: false,
            hide_form: false,
        }
    }
}

impl StartupParams {
    /// Parse `url=..&url=..&urls=a,b&width=300&interval=1&vertical&hide_header&hide_form`.
    /// Invalid or missing values keep their defaults.
    pub fn from_query(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let mut params = Self::default();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "url" => {
                    let value = value.trim();
                    if !value.is_empty() {
                        params.urls.push(value.to_string());
                    }
                }
                "urls" => {
                    params.urls.extend(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|url| !url.is_empty())
                            .map(str::to_string),
                    );
                }
                "width" => {
                    if let Some(width) = parse_width(&value) {
                        params.width = width;
                    }
                }
                "interval" => {
                    if let Some(interval) = parse_interval(&value) {
                        params.interval = interval;
                    }
                }
                "vertical" => params.display_vertical = parse_flag(&value),
                "hide_header" => params.hide_header = parse_flag(&value),
                "hide_form" => params.hide_form = parse_flag(&value),
                other => log::debug!("Ignoring unknown startup parameter: {}", other),
            }
        }

        params
    }
}

pub fn parse_width(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|width| *width > 0)
}

pub fn parse_interval(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|interval| interval.is_finite() && *interval > 0.0)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_empty_query() {
        let params = StartupParams::from_query("");
        assert_eq!(params, StartupParams::default());
        assert_eq!(params.width, 300);
        assert_eq!(params.interval, 1.0);
    }

    #[test]
    fn test_repeated_and_comma_separated_urls() {
        let params = StartupParams::from_query("?url=a.mp4&urls=b.mp4,%20c.mp4,&url=d.mp4");
        assert_eq!(params.urls, vec!["a.mp4", "b.mp4", "c.mp4", "d.mp4"]);
    }

    #[test]
    fn test_numeric_values() {
        let params = StartupParams::from_query("width=480&interval=2.5");
        assert_eq!(params.width, 480);
        assert_eq!(params.interval, 2.5);
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let params = StartupParams::from_query("width=abc&interval=-1");
        assert_eq!(params.width, DEFAULT_WIDTH);
        assert_eq!(params.interval, DEFAULT_INTERVAL);

        let params = StartupParams::from_query("width=0&interval=NaN");
        assert_eq!(params.width, DEFAULT_WIDTH);
        assert_eq!(params.interval, DEFAULT_INTERVAL);
    }

    #[test]
    fn test_boolean_flags() {
        let params = StartupParams::from_query("vertical&hide_header=true&hide_form=1");
        assert!(params.display_vertical);
        assert!(params.hide_header);
        assert!(params.hide_form);

        let params = StartupParams::from_query("vertical=false&hide_header=0&hide_form=maybe");
        assert!(!params.display_vertical);
        assert!(!params.hide_header);
        assert!(!params.hide_form);
    }

    #[test]
    fn test_url_with_fields_is_kept_verbatim() {
        let params = StartupParams::from_query("url=http%3A%2F%2Fa.mp4%3Bthumb.png%3BLabel");
        assert_eq!(params.urls, vec!["http://a.mp4;thumb.png;Label"]);
    }
}
