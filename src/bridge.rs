//! Bridges provider lifecycle events to a reporting callback.
//!
//! Each event firing gets its own resolution task. Nothing is cached, debounced or
//! cancelled, so two events fired back to back may report in either order. Every
//! report carries the sequence number of the firing it answers; wrap the port in
//! [`latest_only`] to drop stale ones.

use std::{cell::Cell, rc::Rc};

use futures::task::{LocalSpawn, LocalSpawnExt};
use log::{debug, error, info};

use super::{
    event::{EventKind, ProviderEvent, Report},
    provider::{EventHandler, ListenerId, Provider},
    rpc,
    wallet::Wallet,
    Error,
};

pub type Port = Rc<dyn Fn(Report)>;

/// Listeners registered by
/// [`MetaMask::handle_wallet_events`](crate::MetaMask::handle_wallet_events).
///
/// Dropping the handle leaves the listeners in place; call [`Subscription::unsubscribe`]
/// to remove them.
pub struct Subscription<P: Provider> {
    provider: Rc<P>,
    listeners: Vec<(EventKind, ListenerId)>,
    listening: Rc<Cell<bool>>,
}

impl<P: Provider> Subscription<P> {
    pub fn listeners(&self) -> &[(EventKind, ListenerId)] {
        &self.listeners
    }

    /// Removes every listener and lets the client register again.
    ///
    /// On failure the subscription comes back holding only the listeners that are
    /// still registered, so the removal can be retried.
    pub fn unsubscribe(mut self) -> Result<(), (Self, Error)> {
        let provider = &self.provider;
        let mut failure = None;
        self.listeners.retain(|(kind, id)| match provider.remove_listener(kind.as_str(), *id) {
            Ok(()) => false,
            Err(err) => {
                error!("Failed to remove {kind} {id}: {err}");
                failure.get_or_insert(Error::Provider(err));
                true
            }
        });

        match failure {
            Some(err) => Err((self, err)),
            None => {
                self.listening.set(false);
                Ok(())
            }
        }
    }
}

impl<P: Provider> std::fmt::Debug for Subscription<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

pub(crate) fn register<P: Provider + 'static>(
    provider: &Rc<P>,
    spawner: &Rc<dyn LocalSpawn>,
    listening: &Rc<Cell<bool>>,
    port: Port,
) -> Result<Subscription<P>, Error> {
    if listening.get() {
        return Err(Error::AlreadyListening);
    }

    let sequence = Rc::new(Cell::new(0));
    let mut listeners = Vec::with_capacity(EventKind::ALL.len());
    for kind in EventKind::ALL {
        let handler =
            listen(kind, provider.clone(), spawner.clone(), port.clone(), sequence.clone());
        match provider.on(kind.as_str(), handler) {
            Ok(id) => listeners.push((kind, id)),
            Err(err) => {
                for (kind, id) in listeners {
                    if let Err(err) = provider.remove_listener(kind.as_str(), id) {
                        error!("Failed to roll back {kind} {id}: {err}");
                    }
                }
                return Err(Error::Provider(err));
            }
        }
    }

    listening.set(true);
    Ok(Subscription { provider: provider.clone(), listeners, listening: listening.clone() })
}

fn listen<P: Provider + 'static>(
    kind: EventKind,
    provider: Rc<P>,
    spawner: Rc<dyn LocalSpawn>,
    port: Port,
    sequence: Rc<Cell<u64>>,
) -> EventHandler {
    Box::new(move |payload| {
        let seq = sequence.get() + 1;
        sequence.set(seq);

        let task = {
            let provider = provider.clone();
            let port = port.clone();
            async move {
                let outcome = resolve(provider.as_ref(), kind, payload).await;
                deliver(&port, seq, kind, outcome);
            }
        };

        if let Err(err) = spawner.spawn_local(task) {
            deliver(&port, seq, kind, Err(Error::Spawn(err)));
        }
    })
}

async fn resolve<P: Provider + ?Sized>(
    provider: &P,
    kind: EventKind,
    payload: serde_json::Value,
) -> Result<Option<Wallet>, Error> {
    match ProviderEvent::from_payload(kind, payload)? {
        ProviderEvent::ChainChanged(chain_id) => {
            debug!("chain changed to {chain_id}");
            match rpc::get_accounts(provider).await?.first() {
                Some(account) => Ok(Some(rpc::get_wallet(provider, *account).await?)),
                None => Ok(None),
            }
        }
        ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
            Some(account) => Ok(Some(rpc::get_wallet(provider, *account).await?)),
            None => Ok(None),
        },
        ProviderEvent::Disconnect(reason) => {
            info!("disconnect: {reason}");
            Ok(None)
        }
    }
}

fn deliver(
    port: &Port,
    sequence: u64,
    event: EventKind,
    outcome: Result<Option<Wallet>, Error>,
) {
    if let Err(err) = &outcome {
        error!("{event}: {err}");
    }
    port(Report { sequence, event, outcome });
}

/// Forwards only reports at least as new as the newest one already forwarded.
pub fn latest_only(port: impl Fn(Report) + 'static) -> impl Fn(Report) + 'static {
    let newest = Cell::new(None::<u64>);
    move |report| {
        if newest.get().map_or(false, |newest| report.sequence < newest) {
            debug!("dropping stale {} report #{}", report.event, report.sequence);
            return;
        }
        newest.set(Some(report.sequence));
        port(report);
    }
}
