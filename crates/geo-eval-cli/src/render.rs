//! Plain-text rendering of keywords and results

use geo_eval_core::CompanyRecord;

/// URLs shown per company in the results table
const URLS_SHOWN: usize = 3;

pub fn keyword_list(keywords: &[String], max_keywords: usize) -> String {
    let mut out = format!("Keywords ({}/{}):\n", keywords.len(), max_keywords);
    for (i, keyword) in keywords.iter().enumerate() {
        out.push_str(&format!("  {:>2}. {}\n", i + 1, keyword));
    }
    out
}

pub fn results_table(results: &[CompanyRecord]) -> String {
    if results.is_empty() {
        return "No companies were cited for these keywords.\n".to_string();
    }

    let width = results
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Company".len());

    let mut out = format!("{:<width$}  Citations\n", "Company", width = width);
    for company in results {
        out.push_str(&format!(
            "{:<width$}  {:>9}\n",
            company.name,
            company.times_cited,
            width = width
        ));
        if !company.urls.is_empty() {
            let shown: Vec<&str> = company
                .urls
                .iter()
                .take(URLS_SHOWN)
                .map(String::as_str)
                .collect();
            out.push_str(&format!("    URLs: {}\n", shown.join(", ")));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_list_numbers_from_one() {
        let list = keyword_list(&["papel".to_string(), "limpeza".to_string()], 10);
        assert_eq!(list, "Keywords (2/10):\n   1. papel\n   2. limpeza\n");
    }

    #[test]
    fn test_results_table_empty() {
        assert_eq!(
            results_table(&[]),
            "No companies were cited for these keywords.\n"
        );
    }

    #[test]
    fn test_results_table_limits_urls() {
        let table = results_table(&[CompanyRecord {
            name: "Acme".to_string(),
            times_cited: 5,
            urls: vec!["u1".into(), "u2".into(), "u3".into(), "u4".into()],
        }]);
        assert!(table.starts_with("Company  Citations\n"));
        assert!(table.contains("Acme             5\n"));
        assert!(table.contains("URLs: u1, u2, u3\n"));
        assert!(!table.contains("u4"));
    }
}
