/// Session options read from the page query string, applied once at session
/// start.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Preset background URL, applied on first load.
    pub background: Option<String>,
    /// Local JSON fixture standing in for the gallery list endpoint.
    pub dataurl: Option<String>,
    /// CORS-proxy prefix prepended to gallery URLs.
    pub proxy: Option<String>,
}

impl SessionConfig {
    /// Parse a raw query string (`background=...&proxy=...`), with or
    /// without the leading `?`. Unknown keys are ignored; the last
    /// occurrence of a repeated key wins.
    pub fn from_query(query: &str) -> Self {
        let mut cfg = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);

        for pair in query.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = match pair.split_once('=') {
                Some((k, v)) => (k, percent_decode(v)),
                None => (pair, String::new()),
            };
            match key {
                "background" => cfg.background = Some(value),
                "dataurl" => cfg.dataurl = Some(value),
                "proxy" => cfg.proxy = Some(value),
                _ => {}
            }
        }
        cfg
    }
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hi = (bytes[i + 1] as char).to_digit(16);
                let lo = (bytes[i + 2] as char).to_digit(16);
                if let (Some(hi), Some(lo)) = (hi, lo) {
                    out.push((hi * 16 + lo) as u8);
                    i += 3;
                } else {
                    // Malformed escape passes through untouched.
                    out.push(b'%');
                    i += 1;
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
