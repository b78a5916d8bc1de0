//! Public URL helpers / 公开URL辅助函数

/// Ensure the domain has a scheme and exactly one trailing slash / 规范化域名
///
/// `cdn.example.com` -> `http://cdn.example.com/`
pub fn normalize_host(domain: &str) -> String {
    let domain = domain.trim();
    let domain = if domain.starts_with("https://") || domain.starts_with("http://") {
        domain.to_string()
    } else {
        format!("http://{}", domain)
    };
    format!("{}/", domain.trim_end_matches('/'))
}

/// Split `path?query` into its path and query parts / 拆分路径与查询串
pub fn split_query(path: &str) -> (&str, Option<&str>) {
    match path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path, None),
    }
}

/// Percent-encode every path segment on its own, keeping `/` separators / 逐段编码路径
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Build `{domain}/{encoded path}[?query]` / 拼接公开访问URL
///
/// An embedded query string is appended untouched, so an already encoded
/// query is never encoded twice.
pub fn public_url(domain: &str, path: &str) -> String {
    let (path, query) = split_query(path);
    let mut url = normalize_host(domain);
    url.push_str(encode_path(path).trim_start_matches('/'));
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(q);
    }
    url
}

/// Append extra query parameters to a URL / 追加查询参数
pub fn append_query<'a, I>(url: &str, params: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut url = url.to_string();
    for (key, value) in params {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&urlencoding::encode(key));
        url.push('=');
        url.push_str(&urlencoding::encode(value));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("cdn.example.com"), "http://cdn.example.com/");
        assert_eq!(normalize_host("https://cdn.example.com//"), "https://cdn.example.com/");
        assert_eq!(normalize_host("http://cdn.example.com/"), "http://cdn.example.com/");
    }

    #[test]
    fn test_public_url_encodes_each_segment() {
        assert_eq!(
            public_url("cdn.example.com", "a b/c.txt"),
            "http://cdn.example.com/a%20b/c.txt"
        );
        assert_eq!(
            public_url("cdn.example.com", "/图片/猫 1.png"),
            "http://cdn.example.com/%E5%9B%BE%E7%89%87/%E7%8C%AB%201.png"
        );
    }

    #[test]
    fn test_public_url_keeps_query() {
        assert_eq!(
            public_url("https://cdn.example.com", "img/a b.jpg?imageView2/1/w/200%2C"),
            "https://cdn.example.com/img/a%20b.jpg?imageView2/1/w/200%2C"
        );
        assert_eq!(public_url("cdn.example.com", "x.txt?"), "http://cdn.example.com/x.txt");
    }

    #[test]
    fn test_append_query() {
        let mut params = BTreeMap::new();
        params.insert("attname".to_string(), "报告 1.pdf".to_string());
        assert_eq!(
            append_query("http://h/a.pdf", &params),
            "http://h/a.pdf?attname=%E6%8A%A5%E5%91%8A%201.pdf"
        );
        assert_eq!(append_query("http://h/a.pdf?x=1", &params).matches('?').count(), 1);
    }
}
