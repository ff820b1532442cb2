use fhub_derive::fhub_error;
use std::borrow::Cow;

#[fhub_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read_missing() -> Result<(), DemoError> {
    std::fs::read("/definitely/not/here").context("Reading fixture")?;
    Ok(())
}

#[test]
fn source_errors_convert_with_context() {
    let err = read_missing().unwrap_err();
    assert_eq!(err.code(), "io");
    assert!(err.to_string().starts_with("IO error (Reading fixture): "));
}

#[test]
fn context_is_attached_to_own_variants() {
    let res: Result<(), DemoError> =
        Err(DemoError::NotFound { message: "TAS999".into(), context: None });
    let err = res.context("Loading package").unwrap_err();

    assert_eq!(err.code(), "not_found");
    assert_eq!(err.to_string(), "Not found (Loading package): TAS999");
}

#[test]
fn strings_become_internal_errors() {
    let from_static: DemoError = "boom".into();
    let from_owned: DemoError = String::from("bang").into();

    assert_eq!(from_static.code(), "internal");
    assert_eq!(from_owned.to_string(), "Internal error: bang");
}
