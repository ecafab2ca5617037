//! System prompts for LLM-based invoice-field extraction.
//!
//! Callers can override the default via
//! [`crate::config::DatasetConfig::system_prompt`]; the constant here is used
//! only when no override is provided.

/// Default system prompt for extracting invoice fields from Markdown.
///
/// The model must reply with a single JSON object whose keys match
/// [`crate::output::InvoiceFields`].
pub const INVOICE_EXTRACTION_PROMPT: &str = r#"You are a helpful assistant that extracts information from invoices that have been converted to Markdown.

The user will provide you with a Markdown document.

Extract the following information:

- datetime
- total amount
- currency
- name of the business
- location of the business (city, state, country)

Return the information as JSON in exactly this shape:

{
    "datetime": "2021-01-01 12:00:00",
    "total_amount": 132.56,
    "currency": "USD",
    "business_name": "Business Name",
    "business_location": "City, State, Country"
}

If you cannot find a field, return null for it. A null is better than a wrong value.

Examples of good responses:

{
    "datetime": null,
    "total_amount": 43.56,
    "currency": "EUR",
    "business_name": null,
    "business_location": null
}

{
    "datetime": null,
    "total_amount": null,
    "currency": null,
    "business_name": null,
    "business_location": null
}

Your response must be only the JSON object, with no other text or comments."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_every_field() {
        for key in [
            "datetime",
            "total_amount",
            "currency",
            "business_name",
            "business_location",
        ] {
            assert!(INVOICE_EXTRACTION_PROMPT.contains(key), "missing {key}");
        }
    }

    #[test]
    fn prompt_examples_parse() {
        let first = INVOICE_EXTRACTION_PROMPT.find('{').unwrap();
        let end = INVOICE_EXTRACTION_PROMPT[first..].find('}').unwrap() + first + 1;
        let example: crate::output::InvoiceFields =
            serde_json::from_str(&INVOICE_EXTRACTION_PROMPT[first..end]).unwrap();
        assert_eq!(example.currency.as_deref(), Some("USD"));
    }
}
