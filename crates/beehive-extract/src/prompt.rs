//! Extraction prompt template

/// Fixed prompt; `{{Title}}` and `{{Content}}` are substituted per article.
const PROMPT_TEMPLATE: &str = r#"You are a threat intelligence analyst. Extract Indicators of Compromise (IoCs) from the following security article.

Include only indicators of attack infrastructure: command-and-control servers, malware distribution URLs, phishing domains, attacker mail addresses, and malware file hashes.

Do NOT include:
- URLs or domains of security vendor blogs, news sites, or research portals
- CVE identifiers
- Names or hashes of legitimate tools
- Ordinary public services (CDNs, search engines, social networks, code hosting)

For each IoC provide its type, the exact value, and a one-sentence description of its role in the reported activity.

Title: {{Title}}

Content:
{{Content}}
"#;

/// Render the extraction prompt for one article.
pub fn render_prompt(title: &str, content: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{{Title}}", title)
        .replace("{{Content}}", content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitution() {
        let prompt = render_prompt("Mirai resurfaces", "the botnet used 192.0.2.1");
        assert!(prompt.contains("Title: Mirai resurfaces"));
        assert!(prompt.contains("the botnet used 192.0.2.1"));
        assert!(!prompt.contains("{{Title}}"));
        assert!(!prompt.contains("{{Content}}"));
    }

    #[test]
    fn test_policy_is_in_the_prompt() {
        let prompt = render_prompt("t", "c");
        assert!(prompt.contains("command-and-control"));
        assert!(prompt.contains("CVE"));
        assert!(prompt.contains("vendor blogs"));
        assert!(prompt.contains("legitimate tools"));
    }
}
