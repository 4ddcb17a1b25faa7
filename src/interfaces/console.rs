use crate::application::engine::LedgerEngine;
use crate::domain::account::{Account, Amount};
use crate::domain::entry::{EntryKind, TransactionEntry};
use crate::error::{Result, WalletError};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Session states. Transitions are driven by operation results: a
/// successful login moves to `Authenticated`, logout moves back.
enum SessionState {
    Anonymous,
    Authenticated(Account),
}

/// Thin interactive Session/IO layer over the ledger engine.
///
/// Collects validated input, invokes the engine, renders results. Generic
/// over its input/output streams so tests can run scripted sessions
/// in-process. Holds no wallet state of its own; the active account lives
/// in the session state and is passed explicitly to every engine call.
pub struct Console<R, W> {
    engine: Arc<LedgerEngine>,
    input: R,
    output: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(engine: Arc<LedgerEngine>, input: R, output: W) -> Self {
        Self {
            engine,
            input,
            output,
        }
    }

    /// Runs the session until the user exits or the input stream ends.
    pub async fn run(&mut self) -> Result<()> {
        let mut state = SessionState::Anonymous;
        loop {
            let next = match state {
                SessionState::Anonymous => self.anonymous_turn().await?,
                SessionState::Authenticated(account) => self.authenticated_turn(account).await?,
            };
            match next {
                Some(s) => state = s,
                None => return Ok(()),
            }
        }
    }

    async fn anonymous_turn(&mut self) -> Result<Option<SessionState>> {
        self.write("\n=== Digital Wallet ===\n1. Login\n2. Register\n3. Exit\n")
            .await?;
        let Some(choice) = self.prompt("Choose option: ").await? else {
            return Ok(None);
        };

        match choice.as_str() {
            "1" => self.login().await,
            "2" => self.register_account().await,
            "3" => Ok(None),
            "4" | "5" | "6" => {
                // An option from the authenticated menu.
                self.report(WalletError::NotAuthenticated).await?;
                Ok(Some(SessionState::Anonymous))
            }
            _ => {
                self.write("Invalid option.\n").await?;
                Ok(Some(SessionState::Anonymous))
            }
        }
    }

    async fn authenticated_turn(&mut self, account: Account) -> Result<Option<SessionState>> {
        self.write(
            "\n1. Deposit\n2. Withdraw\n3. Transfer\n4. Transaction History\n5. Check Balance\n6. Logout\n",
        )
        .await?;
        let Some(choice) = self.prompt("Choose option: ").await? else {
            return Ok(None);
        };

        match choice.as_str() {
            "1" => self.deposit(&account).await?,
            "2" => self.withdraw(&account).await?,
            "3" => self.transfer(&account).await?,
            "4" => self.history(&account).await?,
            "5" => self.check_balance(&account).await?,
            "6" => return Ok(Some(SessionState::Anonymous)),
            _ => self.write("Invalid option.\n").await?,
        }
        Ok(Some(SessionState::Authenticated(account)))
    }

    async fn register_account(&mut self) -> Result<Option<SessionState>> {
        let Some(name) = self.prompt("Enter name: ").await? else {
            return Ok(None);
        };
        let Some(email) = self.prompt("Enter email: ").await? else {
            return Ok(None);
        };
        let Some(credential) = self.prompt("Enter password: ").await? else {
            return Ok(None);
        };

        match self.engine.register(&name, &email, &credential).await {
            Ok(account) => {
                self.block("Registered", &format!("Your ID: {}", account.id))
                    .await?
            }
            Err(err) => self.report(err).await?,
        }
        Ok(Some(SessionState::Anonymous))
    }

    async fn login(&mut self) -> Result<Option<SessionState>> {
        let Some(email) = self.prompt("Enter email: ").await? else {
            return Ok(None);
        };
        let Some(credential) = self.prompt("Enter password: ").await? else {
            return Ok(None);
        };

        match self.engine.authenticate(&email, &credential).await {
            Ok(account) => {
                self.block("Welcome", &account.name).await?;
                Ok(Some(SessionState::Authenticated(account)))
            }
            Err(err) => {
                self.report(err).await?;
                Ok(Some(SessionState::Anonymous))
            }
        }
    }

    async fn deposit(&mut self, account: &Account) -> Result<()> {
        let Some(raw) = self.prompt("Enter amount to deposit: ").await? else {
            return Ok(());
        };
        let result = match parse_amount(&raw) {
            Ok(amount) => self.engine.deposit(account.id, amount).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(balance) => {
                self.block("Deposit", &format!("New balance: {balance}"))
                    .await
            }
            Err(err) => self.report(err).await,
        }
    }

    async fn withdraw(&mut self, account: &Account) -> Result<()> {
        let Some(raw) = self.prompt("Enter amount to withdraw: ").await? else {
            return Ok(());
        };
        let result = match parse_amount(&raw) {
            Ok(amount) => self.engine.withdraw(account.id, amount).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(balance) => {
                self.block("Withdrawal", &format!("New balance: {balance}"))
                    .await
            }
            Err(err) => self.report(err).await,
        }
    }

    async fn transfer(&mut self, account: &Account) -> Result<()> {
        let Some(recipient) = self.prompt("Enter recipient email: ").await? else {
            return Ok(());
        };
        let Some(raw) = self.prompt("Enter amount to send: ").await? else {
            return Ok(());
        };
        let result = match parse_amount(&raw) {
            Ok(amount) => self.engine.transfer(account.id, &recipient, amount).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(balance) => {
                self.block("Transfer", &format!("New balance: {balance}"))
                    .await
            }
            Err(err) => self.report(err).await,
        }
    }

    async fn history(&mut self, account: &Account) -> Result<()> {
        match self.engine.history(account.id).await {
            Ok(entries) => {
                let lines = entries
                    .iter()
                    .map(format_entry)
                    .collect::<Vec<_>>()
                    .join("\n");
                self.block("Transaction History", &lines).await
            }
            Err(err) => self.report(err).await,
        }
    }

    async fn check_balance(&mut self, account: &Account) -> Result<()> {
        match self.engine.balance_of(account.id).await {
            Ok(balance) => self.block("Balance", &balance.to_string()).await,
            Err(err) => self.report(err).await,
        }
    }

    /// Prints a prompt and reads one trimmed line. `None` means the input
    /// stream ended.
    async fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        self.write(label).await?;
        let mut line = String::new();
        let read = self.input.read_line(&mut line).await?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn block(&mut self, title: &str, body: &str) -> Result<()> {
        self.write(&format!(
            "\n=== {title} ===\n{body}\n===========================\n"
        ))
        .await
    }

    /// Renders a failed operation and keeps the session going.
    async fn report(&mut self, err: WalletError) -> Result<()> {
        self.block("Error", &err.to_string()).await
    }
}

fn parse_amount(raw: &str) -> Result<Amount> {
    let value = Decimal::from_str(raw)
        .map_err(|_| WalletError::InvalidAmount(format!("malformed amount: {raw}")))?;
    Amount::new(value)
}

fn format_entry(entry: &TransactionEntry) -> String {
    let label = match entry.kind {
        EntryKind::Deposit => "Deposit",
        EntryKind::Withdrawal => "Withdrawal",
        EntryKind::TransferOut => "Sent",
        EntryKind::TransferIn => "Received",
    };
    match &entry.counterpart {
        Some(who) => format!("{}: {} {} ({})", entry.id, label, entry.amount, who),
        None => format!("{}: {} {}", entry.id, label, entry.amount),
    }
}
