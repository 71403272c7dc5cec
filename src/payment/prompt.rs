use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, instrument, warn};

use super::{MockPaymentResult, PaymentError, TransactionInit, TransactionRequest, TransactionStatus};
use crate::clients::PaymentClient;

/// What the customer is shown on the simulated payment page.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptDetails {
    pub reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub email: String,
    pub authorization_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    Success,
    Failure,
    Cancel,
}

impl PromptChoice {
    /// Accepts `s`/`success`, `f`/`failure`, `c`/`cancel`, case-insensitive.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "s" | "success" => Some(Self::Success),
            "f" | "fail" | "failure" => Some(Self::Failure),
            "c" | "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// Stands in for the hosted payment page: asks how the payment should end.
#[async_trait]
pub trait PaymentPrompt: Send + Sync {
    async fn confirm(&self, details: &PromptDetails) -> Result<PromptChoice, PaymentError>;
}

/// Answers from a fixed script, then repeats `fallback`.
pub struct ScriptedPrompt {
    choices: Mutex<VecDeque<PromptChoice>>,
    fallback: PromptChoice,
}

impl ScriptedPrompt {
    pub fn new(choices: impl IntoIterator<Item = PromptChoice>, fallback: PromptChoice) -> Self {
        Self {
            choices: Mutex::new(choices.into_iter().collect()),
            fallback,
        }
    }

    pub fn always(choice: PromptChoice) -> Self {
        Self::new([], choice)
    }
}

#[async_trait]
impl PaymentPrompt for ScriptedPrompt {
    async fn confirm(&self, details: &PromptDetails) -> Result<PromptChoice, PaymentError> {
        let choice = self.choices.lock().pop_front().unwrap_or(self.fallback);
        info!(reference = %details.reference, ?choice, "Scripted payment choice");
        Ok(choice)
    }
}

/// Asks on the terminal. Unrecognised answers are asked again.
pub struct TerminalPrompt;

#[async_trait]
impl PaymentPrompt for TerminalPrompt {
    async fn confirm(&self, details: &PromptDetails) -> Result<PromptChoice, PaymentError> {
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let banner = format!(
            "\nMock payment {}\n  {} {} for {}\n  {}\n",
            details.reference, details.currency, details.amount, details.email, details.authorization_url
        );
        stdout.write_all(banner.as_bytes()).await.map_err(prompt_io)?;

        loop {
            stdout
                .write_all(b"Complete payment? [s]uccess / [f]ailure / [c]ancel: ")
                .await
                .map_err(prompt_io)?;
            stdout.flush().await.map_err(prompt_io)?;

            let Some(line) = lines.next_line().await.map_err(prompt_io)? else {
                warn!("stdin closed, treating as cancel");
                return Ok(PromptChoice::Cancel);
            };
            match PromptChoice::parse(&line) {
                Some(choice) => return Ok(choice),
                None => stdout.write_all(b"Please answer s, f or c.\n").await.map_err(prompt_io)?,
            }
        }
    }
}

fn prompt_io(err: std::io::Error) -> PaymentError {
    PaymentError::Prompt(err.to_string())
}

/// Runs the simulated payment page end to end.
///
/// Success and failure are recorded on the transaction and returned as a
/// [`MockPaymentResult`]. Cancelling leaves the transaction pending and
/// returns [`PaymentError::Cancelled`].
#[instrument(skip(client, request, prompt), fields(email = %request.email, amount = %request.amount))]
pub async fn initialize_mock_payment(
    client: &PaymentClient,
    request: TransactionRequest,
    prompt: &dyn PaymentPrompt,
) -> Result<MockPaymentResult, PaymentError> {
    let amount = request.amount;
    let email = request.email.clone();
    let currency = request.currency.clone();
    let TransactionInit { reference, authorization_url, .. } = client.initialize_transaction(request).await?;

    let transaction = client
        .get_transaction(reference.clone())
        .await?
        .ok_or_else(|| PaymentError::TransactionNotFound(reference.clone()))?;
    let details = PromptDetails {
        reference: reference.clone(),
        amount,
        currency: currency.unwrap_or(transaction.currency),
        email,
        authorization_url,
    };

    let status = match prompt.confirm(&details).await? {
        PromptChoice::Success => TransactionStatus::Success,
        PromptChoice::Failure => TransactionStatus::Failed,
        PromptChoice::Cancel => {
            info!(reference = %reference, "Payment cancelled by customer");
            return Err(PaymentError::Cancelled { reference });
        }
    };

    let recorded = client.complete_transaction(reference.clone(), status).await?;
    info!(reference = %reference, status = %recorded.status, "Mock payment finished");
    Ok(MockPaymentResult {
        reference,
        status: recorded.status,
        channel: "card".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::{OutcomeConfig, PaymentService, PaymentSettings};
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::time::Duration;

    fn start() -> PaymentClient {
        let settings = PaymentSettings {
            currency: "NGN".into(),
            latency: Duration::ZERO,
            outcome: OutcomeConfig::Always(TransactionStatus::Success),
        };
        let (service, client) = PaymentService::new(8, &settings);
        tokio::spawn(service.run());
        client
    }

    fn request() -> TransactionRequest {
        TransactionRequest {
            amount: dec!(215),
            email: "buyer@example.com".into(),
            reference: None,
            currency: None,
            metadata: json!({ "order_id": "o1" }),
        }
    }

    #[test]
    fn parses_choices() {
        assert_eq!(PromptChoice::parse(" S\n"), Some(PromptChoice::Success));
        assert_eq!(PromptChoice::parse("failure"), Some(PromptChoice::Failure));
        assert_eq!(PromptChoice::parse("c"), Some(PromptChoice::Cancel));
        assert_eq!(PromptChoice::parse("maybe"), None);
    }

    #[tokio::test]
    async fn success_is_recorded() {
        let client = start();
        let result = initialize_mock_payment(&client, request(), &ScriptedPrompt::always(PromptChoice::Success))
            .await
            .unwrap();
        assert_eq!(result.status, TransactionStatus::Success);
        let stored = client.get_transaction(result.reference).await.unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Success);
        assert!(stored.settled_at.is_some());
    }

    #[tokio::test]
    async fn failure_resolves_and_cancel_rejects() {
        let client = start();
        let prompt = ScriptedPrompt::new([PromptChoice::Failure, PromptChoice::Cancel], PromptChoice::Success);

        let failed = initialize_mock_payment(&client, request(), &prompt).await.unwrap();
        assert_eq!(failed.status, TransactionStatus::Failed);

        let err = initialize_mock_payment(&client, request(), &prompt).await.unwrap_err();
        let PaymentError::Cancelled { reference } = err else {
            panic!("expected cancellation, got {err:?}");
        };
        let pending = client.get_transaction(reference).await.unwrap().unwrap();
        assert_eq!(pending.status, TransactionStatus::Pending);
        assert_eq!(client.get_transaction_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn invalid_amount_never_reaches_the_prompt() {
        let client = start();
        let mut req = request();
        req.amount = dec!(-1);
        let err = initialize_mock_payment(&client, req, &ScriptedPrompt::always(PromptChoice::Success))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::InvalidAmount(_)));
    }
}
