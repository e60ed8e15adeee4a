//! Formatter and validator hooks
//!
//! A formatter rewrites a resolved value before coercion. A validator inspects the
//! coerced value afterwards and may suspend, e.g. to consult an external service.

use crate::error::{BoxError, GuardError, InvalidParameter, InvalidReason};
use crate::source::{ParamSource, RequestContext};
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Shared formatter function.
///
/// Returning `Err` aborts the guard with [`GuardError::Unexpected`].
pub type Formatter =
    Arc<dyn Fn(Value, &dyn RequestContext) -> Result<Value, BoxError> + Send + Sync>;

/// Wrap an infallible transform as a [`Formatter`]
pub fn formatter<F>(f: F) -> Formatter
where
    F: Fn(Value, &dyn RequestContext) -> Value + Send + Sync + 'static,
{
    Arc::new(move |value: Value, ctx: &dyn RequestContext| -> Result<Value, BoxError> {
        Ok(f(value, ctx))
    })
}

/// Wrap a fallible transform as a [`Formatter`]
pub fn try_formatter<F, E>(f: F) -> Formatter
where
    F: Fn(Value, &dyn RequestContext) -> Result<Value, E> + Send + Sync + 'static,
    E: Into<BoxError>,
{
    Arc::new(move |value: Value, ctx: &dyn RequestContext| -> Result<Value, BoxError> {
        f(value, ctx).map_err(Into::into)
    })
}

/// Outcome of a custom validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Value is acceptable
    Accept,
    /// Value is rejected with the generic message
    Reject,
    /// Value is rejected with this exact message
    RejectWith(String),
}

/// Conversion of validator return values into a [`Verdict`].
///
/// `true` and `()` accept, `false` rejects, a string rejects with that message.
/// `Err` carries an unexpected failure out of the guard.
pub trait IntoVerdict {
    fn into_verdict(self) -> Result<Verdict, BoxError>;
}

impl IntoVerdict for Verdict {
    fn into_verdict(self) -> Result<Verdict, BoxError> {
        Ok(self)
    }
}

impl IntoVerdict for bool {
    fn into_verdict(self) -> Result<Verdict, BoxError> {
        Ok(if self { Verdict::Accept } else { Verdict::Reject })
    }
}

impl IntoVerdict for () {
    fn into_verdict(self) -> Result<Verdict, BoxError> {
        Ok(Verdict::Accept)
    }
}

impl IntoVerdict for String {
    fn into_verdict(self) -> Result<Verdict, BoxError> {
        Ok(Verdict::RejectWith(self))
    }
}

impl IntoVerdict for &'static str {
    fn into_verdict(self) -> Result<Verdict, BoxError> {
        Ok(Verdict::RejectWith(self.to_string()))
    }
}

impl<T: IntoVerdict> IntoVerdict for Option<T> {
    fn into_verdict(self) -> Result<Verdict, BoxError> {
        match self {
            Some(inner) => inner.into_verdict(),
            None => Ok(Verdict::Accept),
        }
    }
}

impl<T, E> IntoVerdict for Result<T, E>
where
    T: IntoVerdict,
    E: Into<BoxError>,
{
    fn into_verdict(self) -> Result<Verdict, BoxError> {
        self.map_err(Into::into)?.into_verdict()
    }
}

/// Custom per-field validator.
///
/// Implemented for any `Fn(&Value, &dyn RequestContext) -> impl Future` whose
/// output converts into a [`Verdict`]. Use [`SyncValidator`] for plain closures.
#[async_trait]
pub trait ParamValidator: Send + Sync {
    async fn validate(&self, value: &Value, ctx: &dyn RequestContext) -> Result<Verdict, BoxError>;
}

#[async_trait]
impl<F, Fut, R> ParamValidator for F
where
    F: Fn(&Value, &dyn RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoVerdict + Send + 'static,
{
    async fn validate(&self, value: &Value, ctx: &dyn RequestContext) -> Result<Verdict, BoxError> {
        (self)(value, ctx).await.into_verdict()
    }
}

/// Adapter for validators that never suspend.
pub struct SyncValidator<F>(pub F);

#[async_trait]
impl<F, R> ParamValidator for SyncValidator<F>
where
    F: Fn(&Value, &dyn RequestContext) -> R + Send + Sync + 'static,
    R: IntoVerdict + 'static,
{
    async fn validate(&self, value: &Value, ctx: &dyn RequestContext) -> Result<Verdict, BoxError> {
        (self.0)(value, ctx).into_verdict()
    }
}

/// Run the formatter step. Errors pass through as unexpected failures.
pub(crate) fn format(
    formatter: Option<&Formatter>,
    value: Value,
    ctx: &dyn RequestContext,
) -> Result<Value, GuardError> {
    match formatter {
        Some(f) => f(value, ctx).map_err(GuardError::Unexpected),
        None => Ok(value),
    }
}

/// Run the validator step and map its verdict onto the guard's error contract.
pub(crate) async fn check(
    validator: Option<&Arc<dyn ParamValidator>>,
    field: &str,
    source: &ParamSource,
    value: &Value,
    ctx: &dyn RequestContext,
) -> Result<(), GuardError> {
    let Some(validator) = validator else {
        return Ok(());
    };

    match validator.validate(value, ctx).await {
        Ok(Verdict::Accept) => Ok(()),
        Ok(Verdict::Reject) => {
            Err(InvalidParameter::new(field, source.clone(), InvalidReason::Rejected).into())
        }
        Ok(Verdict::RejectWith(message)) => {
            Err(InvalidParameter::new(field, source.clone(), InvalidReason::Custom(message)).into())
        }
        Err(err) => Err(GuardError::Unexpected(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestParts;
    use serde_json::json;

    #[test]
    fn verdict_conversions() {
        assert_eq!(true.into_verdict().unwrap(), Verdict::Accept);
        assert_eq!(false.into_verdict().unwrap(), Verdict::Reject);
        assert_eq!(().into_verdict().unwrap(), Verdict::Accept);
        assert_eq!("bad".into_verdict().unwrap(), Verdict::RejectWith("bad".into()));
        assert_eq!(None::<String>.into_verdict().unwrap(), Verdict::Accept);

        let failed: Result<bool, &str> = Err("boom");
        assert_eq!(failed.into_verdict().unwrap_err().to_string(), "boom");
    }

    #[test]
    fn formatter_replaces_value() {
        let ctx = RequestParts::default();
        let f = formatter(|v, _| json!(display_len(&v)));
        assert_eq!(format(Some(&f), json!("abcd"), &ctx).unwrap(), json!(4));
    }

    #[test]
    fn failing_formatter_is_unexpected() {
        let ctx = RequestParts::default();
        let f = try_formatter(|_, _| Err::<Value, _>("cannot format"));
        let err = format(Some(&f), json!("x"), &ctx).unwrap_err();
        assert!(matches!(err, GuardError::Unexpected(_)));
        assert_eq!(err.to_string(), "cannot format");
    }

    #[tokio::test]
    async fn async_closures_are_validators() {
        let ctx = RequestParts::default();
        let v: Arc<dyn ParamValidator> = Arc::new(|value: &Value, _: &dyn RequestContext| {
            let ok = value == "ok";
            async move { ok }
        });

        assert!(check(Some(&v), "f", &ParamSource::Path, &json!("ok"), &ctx).await.is_ok());
        let err = check(Some(&v), "f", &ParamSource::Path, &json!("no"), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid param 'f' in path");
    }

    #[tokio::test]
    async fn sync_validator_messages_are_verbatim() {
        let ctx = RequestParts::default();
        let v: Arc<dyn ParamValidator> =
            Arc::new(SyncValidator(|_: &Value, _: &dyn RequestContext| "test"));
        let err = check(Some(&v), "f", &ParamSource::Path, &json!(1), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "test");
    }

    fn display_len(value: &Value) -> usize {
        value.as_str().map(str::len).unwrap_or_default()
    }
}
