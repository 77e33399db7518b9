//! Command structs for engine operations.
//!
//! [`SpendForm`] carries the raw user input of a spend registration. It is
//! validated into a [`SpendEvent`] before anything reaches the ledger, so a
//! rejected form never leaves a partial append behind.

use chrono::{DateTime, NaiveDate, Utc};

use crate::{Amount, CategoryCatalog, EngineError, ResultEngine, SpendEvent};

/// Raw spend form input.
#[derive(Clone, Debug, Default)]
pub struct SpendForm {
    pub category: Option<String>,
    pub amount: Option<String>,
    pub description: Option<String>,
    pub payment_method: Option<String>,
}

impl SpendForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn payment_method(mut self, payment_method: impl Into<String>) -> Self {
        self.payment_method = Some(payment_method.into());
        self
    }

    /// Validates the form and builds the event dated `date`.
    ///
    /// Every field is required; the category may be given by key or display
    /// name, and the amount must be a positive decimal.
    pub fn validate(
        &self,
        catalog: &CategoryCatalog,
        date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<SpendEvent> {
        let category = required(self.category.as_deref(), "category")?;
        let amount = required(self.amount.as_deref(), "amount")?;
        let description = required(self.description.as_deref(), "description")?;
        let payment_method = required(self.payment_method.as_deref(), "payment method")?;

        let category = catalog.resolve(category)?;
        let amount: Amount = amount.parse()?;
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
        }

        Ok(SpendEvent::new(
            date,
            category,
            amount,
            description,
            payment_method.to_lowercase(),
            created_at,
        ))
    }
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> ResultEngine<&'a str> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(EngineError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    fn full_form() -> SpendForm {
        SpendForm::new()
            .category("Farmácia")
            .amount("23,90")
            .description("  dipirona ")
            .payment_method("PIX")
    }

    #[test]
    fn valid_form_builds_event() {
        let event = full_form()
            .validate(&CategoryCatalog::default(), day(), Utc::now())
            .unwrap();

        assert_eq!(event.date, day());
        assert_eq!(event.category, "farmacia");
        assert_eq!(event.amount_minor, Amount::new(2390));
        assert_eq!(event.description, "dipirona");
        assert_eq!(event.payment_method, "pix");
    }

    #[test]
    fn missing_fields_are_reported() {
        let catalog = CategoryCatalog::default();
        let mut form = full_form();
        form.description = Some("   ".to_string());
        assert_eq!(
            form.validate(&catalog, day(), Utc::now()),
            Err(EngineError::MissingField("description"))
        );

        let mut form = full_form();
        form.payment_method = None;
        assert_eq!(
            form.validate(&catalog, day(), Utc::now()),
            Err(EngineError::MissingField("payment method"))
        );

        assert_eq!(
            SpendForm::new().validate(&catalog, day(), Utc::now()),
            Err(EngineError::MissingField("category"))
        );
    }

    #[test]
    fn zero_amount_is_rejected() {
        let form = full_form().amount("0,00");
        assert_eq!(
            form.validate(&CategoryCatalog::default(), day(), Utc::now()),
            Err(EngineError::InvalidAmount("amount must be > 0".to_string()))
        );
    }

    #[test]
    fn unknown_category_is_rejected() {
        let form = full_form().category("cinema");
        assert_eq!(
            form.validate(&CategoryCatalog::default(), day(), Utc::now()),
            Err(EngineError::KeyNotFound("cinema".to_string()))
        );
    }
}
