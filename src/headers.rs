use http_client::Request;

/// Desktop Chrome user agent; VK serves the full music snippet only to it
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

const SEC_CH_UA: &str =
    "\"Not)A;Brand\";v=\"8\", \"Chromium\";v=\"138\", \"Google Chrome\";v=\"138\"";
const SEC_CH_UA_MOBILE: &str = "?0";
const SEC_CH_UA_PLATFORM: &str = "\"Linux\"";

/// Add the headers a desktop browser sends with every request
pub fn add_common_headers(request: &mut Request) {
    let _ = request.insert_header("User-Agent", USER_AGENT);
    // Russian first: the page parser keys on the Russian "listens" wording
    let _ = request.insert_header("Accept-Language", "ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7");
    let _ = request.insert_header("DNT", "1");
    let _ = request.insert_header("Connection", "keep-alive");
    let _ = request.insert_header("sec-ch-ua", SEC_CH_UA);
    let _ = request.insert_header("sec-ch-ua-mobile", SEC_CH_UA_MOBILE);
    let _ = request.insert_header("sec-ch-ua-platform", SEC_CH_UA_PLATFORM);
}

/// Add headers for a top-level page navigation
pub fn add_page_headers(request: &mut Request, referer_url: Option<&str>) {
    add_common_headers(request);
    let _ = request.insert_header(
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
    );
    let _ = request.insert_header("Upgrade-Insecure-Requests", "1");
    let _ = request.insert_header("Sec-Fetch-Dest", "document");
    let _ = request.insert_header("Sec-Fetch-Mode", "navigate");

    if let Some(referer) = referer_url {
        let _ = request.insert_header("Referer", referer);
    }
}
