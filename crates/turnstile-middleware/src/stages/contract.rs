//! Request-surface contract guards.
//!
//! One engine checks a [`Contract`] against one [`Section`] of the request.
//! The four constructors [`body`], [`queries`], [`headers`] and [`params`]
//! differ only in the section they read.
//!
//! Fields are checked in contract order and the first violation wins:
//!
//! | Descriptor | Absent value | Present value |
//! |------------|--------------|---------------|
//! | `Named(hint)` | `{hint} is required but missing in {section}` | passes |
//! | `Rich` with validator | passes if optional, else invalid | checked by validator |
//! | `Rich` without validator | passes if optional, else required | passes |
//! | anything else | invalid | checked by the matcher |
//!
//! where *invalid* is `invalid {name} in {section}` and *required* is
//! `{name} is required but missing in {section}`. A `Rich` message replaces
//! either generated message.

use crate::context::GuardContext;
use crate::middleware::{BoxFuture, Guard, Next};
use crate::sections::{buffer_body, parse_body, SectionView};
use crate::types::{Request, Response};
use serde_json::Value;
use turnstile_core::{
    matches, Contract, FieldDescriptor, FieldOptions, GuardError, GuardResult, Section,
};

/// Guard enforcing a contract over one request section.
#[derive(Debug, Clone)]
pub struct ContractGuard {
    section: Section,
    contract: Contract,
}

/// Guards the parsed request body.
#[must_use]
pub fn body(contract: Contract) -> ContractGuard {
    ContractGuard::new(Section::Body, contract)
}

/// Guards the decoded query string.
#[must_use]
pub fn queries(contract: Contract) -> ContractGuard {
    ContractGuard::new(Section::Query, contract)
}

/// Guards the request headers.
#[must_use]
pub fn headers(contract: Contract) -> ContractGuard {
    ContractGuard::new(Section::Header, contract)
}

/// Guards the path parameters.
#[must_use]
pub fn params(contract: Contract) -> ContractGuard {
    ContractGuard::new(Section::Params, contract)
}

impl ContractGuard {
    /// Creates a guard over an arbitrary section.
    #[must_use]
    pub fn new(section: Section, contract: Contract) -> Self {
        Self { section, contract }
    }

    /// Returns the guarded section.
    #[must_use]
    pub const fn section(&self) -> Section {
        self.section
    }

    /// Returns the contract.
    #[must_use]
    pub fn contract(&self) -> &Contract {
        &self.contract
    }
}

impl Guard for ContractGuard {
    fn name(&self) -> &'static str {
        match self.section {
            Section::Body => "body",
            Section::Query => "queries",
            Section::Header => "headers",
            Section::Params => "params",
        }
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut GuardContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, GuardResult<Response>> {
        Box::pin(async move {
            let request = match self.section {
                Section::Body => {
                    let (request, bytes) = buffer_body(request).await;
                    let view = SectionView::body(parse_body(&bytes));
                    check_section(self.section, &self.contract, view.as_ref())?;
                    request
                }
                Section::Query => {
                    let view = SectionView::query(&request);
                    check_section(self.section, &self.contract, view.as_ref())?;
                    request
                }
                Section::Header => {
                    let view = SectionView::headers(&request);
                    check_section(self.section, &self.contract, view.as_ref())?;
                    request
                }
                Section::Params => {
                    let view = SectionView::params(ctx);
                    check_section(self.section, &self.contract, view.as_ref())?;
                    request
                }
            };
            next.run(ctx, request).await
        })
    }
}

/// Checks `contract` against a section view, stopping at the first violation.
///
/// A `None` view means the section is missing from the request entirely.
pub fn check_section(
    section: Section,
    contract: &Contract,
    view: Option<&SectionView<'_>>,
) -> GuardResult<()> {
    let view = view.ok_or_else(|| GuardError::bad_request(format!("missing request {section}")))?;
    for (name, descriptor) in contract.iter() {
        check_field(section, name, descriptor, view.get(name).as_ref())?;
    }
    Ok(())
}

fn check_field(
    section: Section,
    name: &str,
    descriptor: &FieldDescriptor,
    value: Option<&Value>,
) -> GuardResult<()> {
    let invalid = || format!("invalid {name} in {section}");
    let required = || format!("{name} is required but missing in {section}");

    match descriptor {
        FieldDescriptor::Named(hint) => match value {
            Some(_) => Ok(()),
            None => Err(GuardError::bad_request(format!(
                "{hint} is required but missing in {section}"
            ))),
        },
        FieldDescriptor::Rich(FieldOptions {
            validator: Some(validator),
            message,
            optional,
        }) => match value {
            None if *optional => Ok(()),
            Some(value) if matches(value, validator) => Ok(()),
            _ => Err(fail(message.as_deref(), invalid)),
        },
        FieldDescriptor::Rich(FieldOptions {
            validator: None,
            message,
            optional,
        }) => match value {
            None if !*optional => Err(fail(message.as_deref(), required)),
            _ => Ok(()),
        },
        other => match value {
            Some(value) if matches(value, other) => Ok(()),
            _ => Err(GuardError::bad_request(invalid())),
        },
    }
}

fn fail(message: Option<&str>, generated: impl FnOnce() -> String) -> GuardError {
    GuardError::bad_request(message.map_or_else(generated, str::to_string))
}
