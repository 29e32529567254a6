/// `cat:a OR cat:b ...` over the configured categories.
pub fn category_query(categories: &[String]) -> String {
    categories
        .iter()
        .map(|cat| format!("cat:{cat}"))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// One page of the query, newest submissions first.
pub fn page_url(base_url: &str, search_query: &str, start: usize, max_results: usize) -> String {
    let sep = if base_url.contains('?') { '&' } else { '?' };
    format!(
        "{base_url}{sep}search_query={}&start={start}&max_results={max_results}&sortBy=submittedDate&sortOrder=descending",
        urlencoding::encode(search_query)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_query() {
        let cats = vec!["astro-ph".to_string(), "astro-ph.CO".to_string()];
        assert_eq!(category_query(&cats), "cat:astro-ph OR cat:astro-ph.CO");
    }

    #[test]
    fn test_single_category_query() {
        assert_eq!(category_query(&["hep-th".to_string()]), "cat:hep-th");
    }

    #[test]
    fn test_page_url() {
        let url = page_url(
            "https://export.arxiv.org/api/query",
            "cat:astro-ph OR cat:astro-ph.GA",
            400,
            200,
        );
        assert_eq!(
            url,
            "https://export.arxiv.org/api/query?search_query=cat%3Aastro-ph%20OR%20cat%3Aastro-ph.GA\
             &start=400&max_results=200&sortBy=submittedDate&sortOrder=descending"
        );
    }

    #[test]
    fn test_page_url_with_existing_query() {
        let url = page_url("http://mirror/api?key=1", "cat:x", 0, 10);
        assert!(url.starts_with("http://mirror/api?key=1&search_query=cat%3Ax&start=0"));
    }
}
