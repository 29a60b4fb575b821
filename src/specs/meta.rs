// src/specs/meta.rs
use crate::config::consts::{META_SPAN_CLASS, META_SPAN_COUNT};
use crate::core::html::texts_by_class;
use crate::error::{Error, Result};

/// What the search page reported about the vantage point it was served to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub language: String,
    pub country: String,
    pub currency: String,
}

/// Read the three footer spans (language, country, currency) of a saved page.
/// Any other span count rejects the page.
pub fn extract(doc: &str) -> Result<PageMeta> {
    let spans = texts_by_class(doc, "span", META_SPAN_CLASS);
    match <[String; META_SPAN_COUNT]>::try_from(spans) {
        Ok([language, country, currency]) => Ok(PageMeta { language, country, currency }),
        Err(spans) => Err(Error::InvalidInput(format!(
            "expected {META_SPAN_COUNT} metadata spans, found {}",
            spans.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOOTER: &str = r#"<footer>
        <span class="twocKe">English (United States)</span>
        <span class="twocKe">Switzerland</span>
        <span class="twocKe">CHF</span>
    </footer>"#;

    #[test]
    fn three_spans_in_order() {
        let meta = extract(FOOTER).unwrap();
        assert_eq!(meta.language, "English (United States)");
        assert_eq!(meta.country, "Switzerland");
        assert_eq!(meta.currency, "CHF");
    }

    #[test]
    fn wrong_span_count_is_rejected() {
        let two = FOOTER.replace(r#"<span class="twocKe">CHF</span>"#, "");
        let err = extract(&two).unwrap_err();
        assert!(err.to_string().contains("found 2"));

        let four = FOOTER.replace("</footer>", r#"<span class="twocKe">x</span></footer>"#);
        assert!(extract(&four).is_err());
        assert!(extract("").is_err());
    }
}
