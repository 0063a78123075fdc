use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use paydesk_bus::{BusPublisher, EventBus};
use paydesk_ledger::{
    apply_payment, impact_preview, reschedule, roll_in, update_method, update_profile,
    AccountStore, LedgerOutcome, MethodError, PaymentMethod, PaymentTarget, ProfileUpdate,
};
use paydesk_playback::{PlaybackDriver, SessionSnapshot};
use paydesk_schema::{
    BusMessage, Customer, LinkedAccount, Money, Notification, NotificationKind, RecentlyViewed,
    TranscriptMessage,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::{validate_config, PaydeskConfig};
use crate::fixtures::{customer_for_linked, linked_accounts, seed_recently_viewed};
use crate::menu::{manage_plan_actions, ManagePlanAction, SendAction};
use crate::notifications::{NotificationCenter, NotificationSlot, Notifier};

pub const RECENTLY_VIEWED_LIMIT: usize = 10;

/// Customers the agent has switched away from.
#[derive(Debug, Default)]
struct Directory {
    recently_viewed: Vec<RecentlyViewed>,
    parked: HashMap<String, Arc<Customer>>,
}

/// The agent console: account card, call panel and notification toast wired
/// to one event bus.
pub struct Console {
    bus: Arc<EventBus>,
    publisher: BusPublisher,
    store: AccountStore,
    template: Customer,
    linked: Vec<LinkedAccount>,
    directory: Mutex<Directory>,
    playback: PlaybackDriver,
    notifier: Notifier,
    toast: NotificationSlot,
    reschedule_to: Option<NaiveDate>,
    center: JoinHandle<()>,
}

impl Console {
    pub async fn start(config: PaydeskConfig) -> Result<Self> {
        validate_config(&config)?;

        let bus = Arc::new(EventBus::new(config.main.bus.capacity));
        let center =
            NotificationCenter::subscribe(&bus, config.main.notifications.display_ms).await;
        let toast = center.slot();
        let center = tokio::spawn(center.run());

        let playback = PlaybackDriver::new(config.script.messages, config.main.playback, &bus);

        tracing::info!(
            app = %config.main.app.name,
            env = %config.main.app.env,
            account_id = %config.customer.id,
            messages = playback.messages().len(),
            "console started"
        );

        Ok(Self {
            publisher: bus.publisher(),
            notifier: Notifier::new(&bus),
            template: config.customer.clone(),
            store: AccountStore::new(config.customer),
            linked: linked_accounts(),
            directory: Mutex::new(Directory {
                recently_viewed: seed_recently_viewed(),
                parked: HashMap::new(),
            }),
            bus,
            playback,
            toast,
            reschedule_to: config.script.reschedule_to,
            center,
        })
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn account(&self) -> Arc<Customer> {
        self.store.snapshot()
    }

    pub async fn current_notification(&self) -> Option<Notification> {
        self.toast.current().await
    }

    pub fn manage_plan_actions(&self) -> Vec<ManagePlanAction> {
        manage_plan_actions(&self.account())
    }

    pub async fn make_payment(
        &self,
        amount: Money,
        target: PaymentTarget,
        method: &PaymentMethod,
    ) -> Result<Arc<Customer>, MethodError> {
        method.validate()?;
        let description = method.describe(&self.account());
        let outcome = self
            .store
            .apply(|account| apply_payment(account, amount, target, &description));
        Ok(self.commit(outcome).await)
    }

    pub async fn update_payment_method(
        &self,
        method: PaymentMethod,
        billing_address: Option<String>,
    ) -> Result<Arc<Customer>, MethodError> {
        let update = method.into_update(&self.account(), billing_address)?;
        let outcome = self.store.apply(|account| update_method(account, &update));
        Ok(self.commit(outcome).await)
    }

    pub async fn reschedule(&self, new_date: NaiveDate) -> Arc<Customer> {
        let outcome = self.store.apply(|account| reschedule(account, new_date));
        self.commit(outcome).await
    }

    pub async fn roll_in(&self, amount: Money) -> Arc<Customer> {
        let outcome = self.store.apply(|account| roll_in(account, amount));
        self.commit(outcome).await
    }

    /// Returns false when the account is not eligible; nothing is published.
    pub async fn request_extension(&self) -> bool {
        if !self.account().eligible_for_extension {
            tracing::debug!("extension requested for ineligible account");
            return false;
        }
        self.notifier
            .notify(NotificationKind::Sent, "Extension request submitted")
            .await;
        true
    }

    /// Edit the customer's contact details in place.
    pub async fn update_customer(&self, update: ProfileUpdate) -> Arc<Customer> {
        let outcome = self.store.apply(|account| update_profile(account, &update));
        self.commit(outcome).await
    }

    pub fn linked_accounts(&self) -> &[LinkedAccount] {
        &self.linked
    }

    pub async fn recently_viewed(&self) -> Vec<RecentlyViewed> {
        self.directory.lock().await.recently_viewed.clone()
    }

    /// Switch the console to the linked account `id`.
    ///
    /// The customer being left moves to the front of the recently viewed
    /// list and keeps its changes if the agent switches back. Unknown ids
    /// return `None`; selecting the current customer changes nothing.
    pub async fn select_customer(&self, id: &str) -> Option<Arc<Customer>> {
        let mut directory = self.directory.lock().await;
        let current = self.account();
        if current.id == id {
            return Some(current);
        }

        let next = match directory.parked.remove(id) {
            Some(parked) => Customer::clone(&parked),
            None => {
                let Some(linked) = self.linked.iter().find(|l| l.id == id) else {
                    tracing::debug!(account_id = id, "no linked account with this id");
                    return None;
                };
                customer_for_linked(&self.template, linked)
            }
        };

        let previous = self.store.replace(next);
        remember_viewed(
            &mut directory.recently_viewed,
            RecentlyViewed {
                id: previous.id.clone(),
                name: previous.name.clone(),
            },
        );
        directory.parked.insert(previous.id.clone(), previous.clone());
        drop(directory);

        let selected = self.store.snapshot();
        tracing::info!(account_id = %selected.id, previous_id = %previous.id, "customer selected");
        let _ = self
            .publisher
            .publish(BusMessage::AccountSelected {
                account_id: selected.id.clone(),
                previous_id: previous.id.clone(),
                at: Utc::now(),
            })
            .await;
        Some(selected)
    }

    pub async fn send_to_customer(&self, action: SendAction) {
        tracing::info!(?action, "sent to customer");
        self.notifier.publish(action.notification()).await;
    }

    pub async fn call_snapshot(&self) -> SessionSnapshot {
        self.playback.snapshot().await
    }

    pub async fn transcript(&self) -> Vec<TranscriptMessage> {
        self.playback.visible_messages().await
    }

    pub async fn open_call_panel(&self) -> bool {
        self.playback.open().await
    }

    pub async fn close_call_panel(&self) {
        self.playback.close().await;
    }

    pub async fn answer_call(&self) -> Option<u64> {
        self.playback.answer().await
    }

    /// Transcript "Apply reschedule" action. When it reveals the success
    /// message the account is rescheduled to the scripted date as well.
    pub async fn apply_reschedule(&self) -> bool {
        if !self.playback.apply_reschedule().await {
            return false;
        }
        if let Some(date) = self.reschedule_to {
            self.reschedule(date).await;
        }
        true
    }

    pub async fn view_impact(&self) {
        self.playback.view_impact().await;
    }

    pub async fn dismiss_impact(&self) {
        self.playback.dismiss_impact().await;
    }

    /// Overlay text for "View impact"; `None` when the script proposes no date.
    pub fn impact_preview(&self) -> Option<String> {
        self.reschedule_to
            .map(|date| impact_preview(&self.account(), date))
    }

    async fn commit(&self, outcome: LedgerOutcome) -> Arc<Customer> {
        let LedgerOutcome {
            operation,
            account,
            notification,
        } = outcome;
        let _ = self
            .publisher
            .publish(BusMessage::AccountUpdated {
                account_id: account.id.clone(),
                operation,
                at: Utc::now(),
            })
            .await;
        self.notifier.publish(notification).await;
        self.store.snapshot()
    }
}

/// Put `entry` at the front, dropping any older copy and anything past the
/// limit.
fn remember_viewed(list: &mut Vec<RecentlyViewed>, entry: RecentlyViewed) {
    list.retain(|viewed| viewed.id != entry.id);
    list.insert(0, entry);
    list.truncate(RECENTLY_VIEWED_LIMIT);
}

impl Drop for Console {
    fn drop(&mut self) {
        self.center.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paydesk_bus::Topic;
    use paydesk_schema::{LedgerOperation, NotificationKind};
    use tokio::time::{sleep, Duration};

    #[tokio::test(start_paused = true)]
    async fn payment_replaces_account_and_notifies() {
        let console = Console::start(PaydeskConfig::builtin()).await.unwrap();
        let mut updates = console.bus().subscribe(Topic::AccountUpdated).await;

        let account = console
            .make_payment(Money::from_cents(20_000), PaymentTarget::Both, &PaymentMethod::Default)
            .await
            .unwrap();
        assert_eq!(account.next_payment, Money::ZERO);
        assert_eq!(account.payment_plan_balance, Money::from_cents(36_207));
        assert_eq!(account.utility_total_balance, Money::from_cents(64_484));

        match updates.recv().await.unwrap() {
            BusMessage::AccountUpdated { operation, .. } => {
                assert_eq!(operation, LedgerOperation::ApplyPayment)
            }
            other => panic!("unexpected message: {other:?}"),
        }

        sleep(Duration::from_millis(10)).await;
        let shown = console.current_notification().await.unwrap();
        assert_eq!(
            shown.message,
            "Payment of $200.00 to payment plan and utility bill processed successfully"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_method_leaves_account_untouched() {
        let console = Console::start(PaydeskConfig::builtin()).await.unwrap();
        let before = console.account();
        let err = console
            .make_payment(
                Money::from_cents(1_000),
                PaymentTarget::Plan,
                &PaymentMethod::Venmo {
                    handle: "  ".into(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, MethodError::MissingVenmoHandle);
        assert_eq!(*console.account(), *before);

        sleep(Duration::from_millis(10)).await;
        assert!(console.current_notification().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn extension_needs_eligibility() {
        let mut config = PaydeskConfig::builtin();
        assert!(!Console::start(config.clone()).await.unwrap().request_extension().await);

        config.customer.eligible_for_extension = true;
        let console = Console::start(config).await.unwrap();
        assert_eq!(
            console.manage_plan_actions().last().copied(),
            Some(ManagePlanAction::OneTimeExtension)
        );
        assert!(console.request_extension().await);
        sleep(Duration::from_millis(10)).await;
        let shown = console.current_notification().await.unwrap();
        assert_eq!(shown.kind, NotificationKind::Sent);
        assert_eq!(shown.message, "Extension request submitted");
    }

    #[tokio::test(start_paused = true)]
    async fn profile_update_publishes_account_update() {
        let console = Console::start(PaydeskConfig::builtin()).await.unwrap();
        let mut updates = console.bus().subscribe(Topic::AccountUpdated).await;
        let before = console.account();

        let account = console
            .update_customer(ProfileUpdate {
                phone: Some("(555) 987-6543".into()),
                ..ProfileUpdate::default()
            })
            .await;
        assert_eq!(account.phone, "(555) 987-6543");
        assert_eq!(account.email, before.email);
        assert_eq!(before.phone, "(555) 123-4567");

        match updates.recv().await.unwrap() {
            BusMessage::AccountUpdated { operation, .. } => {
                assert_eq!(operation, LedgerOperation::UpdateProfile)
            }
            other => panic!("unexpected message: {other:?}"),
        }
        sleep(Duration::from_millis(10)).await;
        assert_eq!(
            console.current_notification().await.unwrap().message,
            "Customer details updated"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_customers_tracks_recently_viewed() {
        let console = Console::start(PaydeskConfig::builtin()).await.unwrap();
        let mut selected = console.bus().subscribe(Topic::AccountSelected).await;
        console.roll_in(Money::from_cents(10_000)).await;

        assert!(console.select_customer("nope").await.is_none());
        assert_eq!(console.select_customer("142612-0005065").await.unwrap().id, "142612-0005065");
        assert_eq!(console.recently_viewed().await.len(), 3);

        let other = console.select_customer("142612-0005345").await.unwrap();
        assert_eq!(other.name, "Sarah Johnson");
        assert_eq!(other.address, "4521 Hollywood Blvd, Los Angeles, CA 90027");
        match selected.recv().await.unwrap() {
            BusMessage::AccountSelected {
                account_id,
                previous_id,
                ..
            } => {
                assert_eq!(account_id, "142612-0005345");
                assert_eq!(previous_id, "142612-0005065");
            }
            other => panic!("unexpected message: {other:?}"),
        }

        console.select_customer("142612-0005123").await.unwrap();
        let back = console.select_customer("142612-0005065").await.unwrap();
        assert_eq!(back.payment_plan_balance, Money::from_cents(58_276));

        let ids: Vec<_> = console
            .recently_viewed()
            .await
            .into_iter()
            .map(|viewed| viewed.id)
            .collect();
        assert_eq!(
            ids,
            ["142612-0005123", "142612-0005345", "142612-0005065", "1", "2", "3"]
        );
    }

    #[test]
    fn recently_viewed_is_deduped_and_bounded() {
        let mut list = Vec::new();
        for n in 0..12 {
            remember_viewed(
                &mut list,
                RecentlyViewed {
                    id: n.to_string(),
                    name: format!("Customer {n}"),
                },
            );
        }
        remember_viewed(
            &mut list,
            RecentlyViewed {
                id: "5".into(),
                name: "Customer 5".into(),
            },
        );

        assert_eq!(list.len(), RECENTLY_VIEWED_LIMIT);
        assert_eq!(list[0].id, "5");
        assert_eq!(list.iter().filter(|viewed| viewed.id == "5").count(), 1);
        assert_eq!(list[1].id, "11");
        assert_eq!(list.last().map(|viewed| viewed.id.as_str()), Some("2"));
    }
}
