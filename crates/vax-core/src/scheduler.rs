use tracing::info;
use vax_crypto::{Blake3CredentialHasher, CredentialHasher};
use vax_ledger::{
    AppointmentLedger, AvailabilityBoard, InvariantValidator, InventoryLedger, ScheduleRow,
    ValidationReport,
};
use vax_store::{AccountRecord, Mutation, SchedulingStore};
use vax_types::{AppointmentId, Role, SlotDate, Username, VaccineName};

use crate::config::SchedulerConfig;
use crate::error::{SchedulerError, SchedulerResult};
use crate::outcome::{AppointmentView, Reservation};
use crate::session::{Identity, Session};

/// Session manager and scheduling core over a transactional store.
///
/// Every mutating operation runs as one store transaction, so concurrent
/// callers sharing a `Scheduler` can never both consume the same slot or
/// dose. Sessions are owned by callers and passed in.
pub struct Scheduler<S> {
    store: S,
    hasher: Box<dyn CredentialHasher>,
}

impl<S: SchedulingStore> Scheduler<S> {
    /// Scheduler with the default credential hasher.
    pub fn new(store: S) -> Self {
        Self::with_hasher(store, Blake3CredentialHasher::default())
    }

    pub fn with_hasher(store: S, hasher: impl CredentialHasher + 'static) -> Self {
        Self {
            store,
            hasher: Box::new(hasher),
        }
    }

    pub fn from_config(store: S, config: &SchedulerConfig) -> SchedulerResult<Self> {
        let hasher = Blake3CredentialHasher::new(config.hash_rounds)?;
        Ok(Self::with_hasher(store, hasher))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ---- Session manager ----

    pub fn register_provider(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
    ) -> SchedulerResult<Username> {
        self.register(session, Role::Provider, username, password)
    }

    pub fn register_recipient(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
    ) -> SchedulerResult<Username> {
        self.register(session, Role::Recipient, username, password)
    }

    pub fn login_provider(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
    ) -> SchedulerResult<Username> {
        self.login(session, Role::Provider, username, password)
    }

    pub fn login_recipient(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
    ) -> SchedulerResult<Username> {
        self.login(session, Role::Recipient, username, password)
    }

    pub fn logout(&self, session: &mut Session) -> SchedulerResult<Identity> {
        let identity = session.end()?;
        info!(role = %identity.role(), username = %identity.username(), "logged out");
        Ok(identity)
    }

    /// Create an account in `role`'s table and log it in.
    fn register(
        &self,
        session: &mut Session,
        role: Role,
        username: &str,
        password: &str,
    ) -> SchedulerResult<Username> {
        session.ensure_inactive()?;
        let username = Username::new(username)?;
        let credentials = self.hasher.issue(password)?;

        self.store.transact(|tx| {
            if tx.tables().account(role, &username).is_some() {
                return Err(SchedulerError::UsernameTaken {
                    role,
                    username: username.clone(),
                });
            }
            tx.apply(Mutation::InsertAccount {
                role,
                record: AccountRecord {
                    username: username.clone(),
                    credentials,
                },
            });
            Ok(())
        })?;

        session.begin(Identity::new(role, username.clone()))?;
        info!(%role, username = %username, "account created");
        Ok(username)
    }

    fn login(
        &self,
        session: &mut Session,
        role: Role,
        username: &str,
        password: &str,
    ) -> SchedulerResult<Username> {
        session.ensure_inactive()?;
        let username = Username::new(username).map_err(|_| SchedulerError::AuthenticationFailed)?;
        let credentials = self
            .store
            .read(|t| t.account(role, &username).map(|a| a.credentials.clone()))?
            .ok_or(SchedulerError::AuthenticationFailed)?;

        if !self.hasher.verify(password, &credentials) {
            return Err(SchedulerError::AuthenticationFailed);
        }
        session.begin(Identity::new(role, username.clone()))?;
        info!(%role, username = %username, "logged in");
        Ok(username)
    }

    // ---- Scheduling core ----

    /// Open providers on `date` joined with the dose inventory.
    pub fn search_schedule(
        &self,
        session: &Session,
        date: SlotDate,
    ) -> SchedulerResult<Vec<ScheduleRow>> {
        session.require_any()?;
        Ok(self
            .store
            .read(|t| AvailabilityBoard::find_open_slots(t, date))?)
    }

    /// Book one dose of `vaccine` with a provider open on `date`.
    ///
    /// The provider is the lexicographically smallest username holding an
    /// open slot on `date`. Exactly that provider's slot for that date is
    /// consumed, and one dose leaves the inventory.
    pub fn reserve(
        &self,
        session: &Session,
        date: SlotDate,
        vaccine: &VaccineName,
    ) -> SchedulerResult<Reservation> {
        let recipient = session.require(Role::Recipient)?.clone();

        let appointment = self.store.transact(|tx| {
            let provider = AvailabilityBoard::open_providers(tx.tables(), date)
                .into_iter()
                .next()
                .ok_or(SchedulerError::NoAvailability { date })?;

            let stock = InventoryLedger::get_doses(tx.tables(), vaccine).unwrap_or(0);
            if stock == 0 {
                return Err(SchedulerError::InsufficientDoses {
                    vaccine: vaccine.clone(),
                });
            }

            AvailabilityBoard::consume_slot(tx, &provider, date)?;
            InventoryLedger::decrease_doses(tx, vaccine, 1)?;
            Ok(AppointmentLedger::book(tx, date, &provider, &recipient, vaccine))
        })?;

        info!(
            id = %appointment.id,
            provider = %appointment.provider,
            recipient = %appointment.recipient,
            %date,
            vaccine = %vaccine,
            "appointment reserved"
        );
        Ok(Reservation::from(&appointment))
    }

    /// Cancel an appointment the caller is a party to.
    ///
    /// Re-opens the provider's slot for the date and returns the dose to
    /// stock.
    pub fn cancel(&self, session: &Session, id: AppointmentId) -> SchedulerResult<Reservation> {
        let caller = session.require_any()?.clone();

        let appointment = self.store.transact(|tx| {
            let appointment = AppointmentLedger::get(tx.tables(), id)?.clone();
            let is_party = match &caller {
                Identity::Provider(u) => *u == appointment.provider,
                Identity::Recipient(u) => *u == appointment.recipient,
            };
            if !is_party {
                return Err(SchedulerError::NotAuthorized(id));
            }

            AppointmentLedger::remove(tx, id)?;
            AvailabilityBoard::restore_slot(tx, &appointment.provider, appointment.date);
            InventoryLedger::restore_doses(tx, &appointment.vaccine, 1)?;
            Ok(appointment)
        })?;

        info!(
            %id,
            by = %caller.username(),
            provider = %appointment.provider,
            date = %appointment.date,
            "appointment cancelled"
        );
        Ok(Reservation::from(&appointment))
    }

    /// Add delivered doses. Provider only. Returns the new available count.
    pub fn add_doses(
        &self,
        session: &Session,
        vaccine: &VaccineName,
        count: u64,
    ) -> SchedulerResult<u64> {
        session.require(Role::Provider)?;
        let available = self
            .store
            .transact(|tx| InventoryLedger::add_doses(tx, vaccine, count))?;
        info!(vaccine = %vaccine, count, available, "doses updated");
        Ok(available)
    }

    /// Offer the logged-in provider's capacity on `date`.
    ///
    /// Returns `true` if a new slot was opened, `false` if it was already
    /// open.
    pub fn upload_availability(&self, session: &Session, date: SlotDate) -> SchedulerResult<bool> {
        let provider = session.require(Role::Provider)?.clone();
        let opened = self
            .store
            .transact(|tx| AvailabilityBoard::upload(tx, &provider, date))?;
        info!(provider = %provider, %date, opened, "availability uploaded");
        Ok(opened)
    }

    /// The caller's appointments ordered by id.
    pub fn appointments(&self, session: &Session) -> SchedulerResult<Vec<AppointmentView>> {
        let identity = session.require_any()?;
        let role = identity.role();
        let username = identity.username();

        Ok(self.store.read(|t| {
            let rows = match role {
                Role::Provider => AppointmentLedger::for_provider(t, username),
                Role::Recipient => AppointmentLedger::for_recipient(t, username),
            };
            rows.into_iter()
                .map(|a| AppointmentView::for_viewer(a, role))
                .collect()
        })?)
    }

    /// Available doses of `vaccine`, or `None` if it was never stocked.
    pub fn dose_count(&self, vaccine: &VaccineName) -> SchedulerResult<Option<u64>> {
        Ok(self
            .store
            .read(|t| t.dose_inventory(vaccine).map(|e| e.available))?)
    }

    /// Audit the cross-ledger invariants on committed state.
    pub fn verify(&self) -> SchedulerResult<ValidationReport> {
        Ok(self.store.read(InvariantValidator::validate)?)
    }
}
