//! Mock implementations for all capability traits
//!
//! In-memory doubles that record how they were called so tests can assert
//! on short-circuiting, single-flight and retry behaviour without a chain
//! node or a delivery gateway.

use async_trait::async_trait;
use notifier_core::{
    Address, DeliveryGateway, DeliveryReceipt, NetworkId, Notification, NotifierError,
    NotifierResult, RawCatalog, RegistrySource, SigningCredential, TokenContract,
    TokenContractFactory, WalletProvider, U256,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock implementation of RegistrySource
#[derive(Debug, Clone, Default)]
pub struct MockRegistrySource {
    catalog: Arc<Mutex<RawCatalog>>,
    failure: Arc<Mutex<Option<String>>>,
    fetch_count: Arc<AtomicUsize>,
}

impl MockRegistrySource {
    pub fn new(catalog: RawCatalog) -> Self {
        Self {
            catalog: Arc::new(Mutex::new(catalog)),
            ..Self::default()
        }
    }

    pub fn set_catalog(&self, catalog: RawCatalog) {
        *self.catalog.lock().unwrap() = catalog;
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistrySource for MockRegistrySource {
    async fn fetch_registry_document(&self) -> NotifierResult<RawCatalog> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(NotifierError::RegistryFetch(message));
        }
        Ok(self.catalog.lock().unwrap().clone())
    }
}

/// Mock ERC-20 contract with per-owner balances
#[derive(Debug)]
pub struct MockTokenContract {
    address: Address,
    name: String,
    decimals: u8,
    balances: Mutex<HashMap<Address, U256>>,
    failing: AtomicBool,
    balance_calls: AtomicUsize,
}

impl MockTokenContract {
    pub fn new(address: Address, name: &str, decimals: u8) -> Self {
        Self {
            address,
            name: name.to_string(),
            decimals,
            balances: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
            balance_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_balance(&self, owner: Address, raw: U256) {
        self.balances.lock().unwrap().insert(owner, raw);
    }

    /// 之后的所有合约调用都返回错误
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    fn check_failing(&self) -> NotifierResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifierError::ContractRead {
                address: self.address,
                message: "mock contract failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TokenContract for MockTokenContract {
    fn address(&self) -> Address {
        self.address
    }

    async fn decimals(&self) -> NotifierResult<u8> {
        self.check_failing()?;
        Ok(self.decimals)
    }

    async fn name(&self) -> NotifierResult<String> {
        self.check_failing()?;
        Ok(self.name.clone())
    }

    async fn balance_of(&self, owner: Address) -> NotifierResult<U256> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&owner)
            .copied()
            .unwrap_or(U256::ZERO))
    }
}

/// Mock implementation of TokenContractFactory
#[derive(Debug, Clone, Default)]
pub struct MockTokenContracts {
    tokens: Arc<Mutex<HashMap<Address, Arc<MockTokenContract>>>>,
    requested_networks: Arc<Mutex<Vec<Option<NetworkId>>>>,
}

impl MockTokenContracts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_token(&self, address: Address, name: &str, decimals: u8) -> Arc<MockTokenContract> {
        let token = Arc::new(MockTokenContract::new(address, name, decimals));
        self.tokens
            .lock()
            .unwrap()
            .insert(address, Arc::clone(&token));
        token
    }

    pub fn token(&self, address: Address) -> Option<Arc<MockTokenContract>> {
        self.tokens.lock().unwrap().get(&address).cloned()
    }

    pub fn total_balance_calls(&self) -> usize {
        self.tokens
            .lock()
            .unwrap()
            .values()
            .map(|token| token.balance_calls())
            .sum()
    }

    pub fn requested_networks(&self) -> Vec<Option<NetworkId>> {
        self.requested_networks.lock().unwrap().clone()
    }
}

impl TokenContractFactory for MockTokenContracts {
    fn token_contract(
        &self,
        address: Address,
        network: Option<&NetworkId>,
    ) -> NotifierResult<Arc<dyn TokenContract>> {
        self.requested_networks
            .lock()
            .unwrap()
            .push(network.cloned());

        match self.tokens.lock().unwrap().get(&address) {
            Some(token) => Ok(Arc::clone(token) as Arc<dyn TokenContract>),
            None => Err(NotifierError::ContractRead {
                address,
                message: "no mock contract at address".to_string(),
            }),
        }
    }
}

/// Mock delivery gateway recording every notification it accepts
#[derive(Debug, Clone, Default)]
pub struct MockDeliveryGateway {
    subscribers: Arc<Mutex<Vec<Address>>>,
    sent: Arc<Mutex<Vec<Notification>>>,
    attempts: Arc<Mutex<HashMap<Address, usize>>>,
    // 剩余失败次数，usize::MAX 表示永远失败
    scripted_failures: Arc<Mutex<HashMap<Address, usize>>>,
    list_calls: Arc<AtomicUsize>,
    list_delay: Arc<Mutex<Option<Duration>>>,
    send_delay: Arc<Mutex<Option<Duration>>>,
    list_failure: Arc<Mutex<Option<String>>>,
}

impl MockDeliveryGateway {
    pub fn new(subscribers: Vec<Address>) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(subscribers)),
            ..Self::default()
        }
    }

    pub fn fail_always(&self, recipient: Address) {
        self.scripted_failures
            .lock()
            .unwrap()
            .insert(recipient, usize::MAX);
    }

    pub fn fail_times(&self, recipient: Address, times: usize) {
        self.scripted_failures
            .lock()
            .unwrap()
            .insert(recipient, times);
    }

    pub fn fail_list_with(&self, message: &str) {
        *self.list_failure.lock().unwrap() = Some(message.to_string());
    }

    /// 让订阅者列表请求挂起一段时间，便于制造并发周期
    pub fn set_list_delay(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = Some(delay);
    }

    /// 让每次发送挂起一段时间，模拟慢速投递
    pub fn set_send_delay(&self, delay: Duration) {
        *self.send_delay.lock().unwrap() = Some(delay);
    }

    pub fn sent_notifications(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts_for(&self, recipient: Address) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .get(&recipient)
            .copied()
            .unwrap_or(0)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryGateway for MockDeliveryGateway {
    async fn list_subscribers(&self, _credential: &SigningCredential) -> NotifierResult<Vec<Address>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.list_failure.lock().unwrap().clone() {
            return Err(NotifierError::SubscriberFetch(message));
        }
        Ok(self.subscribers.lock().unwrap().clone())
    }

    async fn send_notification(
        &self,
        _credential: &SigningCredential,
        notification: &Notification,
    ) -> NotifierResult<DeliveryReceipt> {
        let recipient = notification.recipient;
        *self.attempts.lock().unwrap().entry(recipient).or_insert(0) += 1;

        let delay = *self.send_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        {
            let mut failures = self.scripted_failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&recipient) {
                if *remaining > 0 {
                    if *remaining != usize::MAX {
                        *remaining -= 1;
                    }
                    return Err(NotifierError::Delivery(format!(
                        "scripted failure for {recipient}"
                    )));
                }
            }
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(notification.clone());
        Ok(DeliveryReceipt {
            recipient,
            simulated: notification.simulate,
            reference: Some(format!("mock-{}", sent.len())),
        })
    }
}

/// Mock wallet provider handing out a fixed credential
#[derive(Debug, Clone)]
pub struct MockWalletProvider {
    credential: SigningCredential,
    calls: Arc<AtomicUsize>,
}

impl MockWalletProvider {
    pub fn new(credential: SigningCredential) -> Self {
        Self {
            credential,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for MockWalletProvider {
    async fn signing_credential(&self, channel_id: &str) -> NotifierResult<SigningCredential> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if channel_id != self.credential.channel_id() {
            return Err(NotifierError::Wallet(format!("unknown channel: {channel_id}")));
        }
        Ok(self.credential.clone())
    }
}
