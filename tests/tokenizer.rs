use cartograph::search::tokenizer::{document_terms, query_terms, split_camel, tokenize};

#[test]
fn snake_case_splits_on_delimiters() {
    let tokens = tokenize("get_user_name");
    assert!(tokens.contains(&"get".to_string()));
    assert!(tokens.contains(&"user".to_string()));
    assert!(tokens.contains(&"name".to_string()));
}

#[test]
fn camel_case_splits_and_keeps_whole_identifier() {
    let tokens = tokenize("getUserName");
    assert!(tokens.contains(&"getusername".to_string()));
    assert!(tokens.contains(&"user".to_string()));
    assert!(tokens.contains(&"name".to_string()));
}

#[test]
fn capital_runs_stay_together() {
    assert_eq!(split_camel("HTTPServer"), vec!["HTTP", "Server"]);
}

#[test]
fn tokens_are_lowercased() {
    let tokens = tokenize("UserController");
    assert!(tokens.contains(&"usercontroller".to_string()));
    assert!(tokens.contains(&"controller".to_string()));
    assert!(tokens.iter().all(|t| t.chars().all(|c| !c.is_uppercase())));
}

#[test]
fn stop_words_and_short_tokens_are_dropped() {
    let tokens = tokenize("return the id of a user");
    assert!(!tokens.contains(&"return".to_string()));
    assert!(!tokens.contains(&"the".to_string()));
    assert!(!tokens.contains(&"id".to_string())); // too short
    assert!(tokens.contains(&"user".to_string()));
}

#[test]
fn query_terms_deduplicate() {
    assert_eq!(query_terms("user user USER"), vec!["user".to_string()]);
}

#[test]
fn empty_document_has_well_defined_empty_vector() {
    let counts = document_terms("f", None, None);
    assert!(counts.is_empty());
}

#[test]
fn document_counts_accumulate_across_buckets() {
    let counts = document_terms(
        "validate_email",
        Some("validate_email(address)"),
        Some("Validate an email address."),
    );
    assert_eq!(counts.get("email"), Some(&3));
    assert!(counts.get("validate").is_some());
    assert!(counts.get("address").is_some());
}
