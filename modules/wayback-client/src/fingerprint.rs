use std::collections::HashMap;

/// Chrome release the fingerprint is pinned to.
const CHROME_VERSION: &str = "130.0.0.0";

/// Build the browser-identity headers sent with every archive request:
/// a fixed Chrome-on-Windows fingerprint plus a Referer pointing at the
/// archive's own viewer page for this (timestamp, url) pair. Pure
/// function, no I/O.
pub fn fingerprint_headers(url: &str, timestamp: &str) -> HashMap<String, String> {
    let major = CHROME_VERSION.split('.').next().unwrap_or(CHROME_VERSION);

    let mut headers = HashMap::new();
    headers.insert(
        "User-Agent".to_string(),
        format!(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
             AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{CHROME_VERSION} Safari/537.36"
        ),
    );
    headers.insert(
        "Referer".to_string(),
        format!("https://web.archive.org/web/{timestamp}/https://{url}"),
    );
    headers.insert(
        "sec-ch-ua".to_string(),
        format!(
            "\"Chromium\";v=\"{major}\", \"Google Chrome\";v=\"{major}\", \
             \"Not?A_Brand\";v=\"99\""
        ),
    );
    headers.insert("sec-ch-ua-mobile".to_string(), "?0".to_string());
    headers.insert("sec-ch-ua-platform".to_string(), "\"Windows\"".to_string());
    headers.insert("DNT".to_string(), "1".to_string());

    headers
}
