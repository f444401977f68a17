//! One logical cart across signed-out and signed-in use.
//!
//! [`CartContext`] is the provider the view layer holds by reference. In
//! guest mode the cart lives in local storage; in user mode it lives on the
//! server and the context only caches the last fetch. Every mutation is
//! followed by a full recount from whichever source is authoritative.
//!
//! The context never navigates. A [`ClientError::Unauthorized`] from
//! [`CartContext::cart_lines`] or [`CartContext::wishlist`] is the caller's
//! cue to send the user to sign in.

use std::sync::{PoisonError, RwLock};

use futures::future::join_all;
use shrine_core::cart::total_quantity;
use shrine_core::{AddOutcome, CartCounts, CartLine, LocalState, Product, ProductRef, Session};

use crate::client::ApiClient;
use crate::error::ClientError;

/// Which store is authoritative for the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Guest,
    User,
}

/// Outcome of moving the guest cart into the server cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Lines sent to the server.
    pub attempted: usize,
    /// Lines the server did not accept. These are not retried and are gone.
    pub failed: usize,
}

impl MergeReport {
    #[must_use]
    pub fn merged(&self) -> usize {
        self.attempted - self.failed
    }
}

#[derive(Debug, Default)]
struct Snapshot {
    counts: CartCounts,
    server_cart: Vec<CartLine>,
    wishlist: Vec<Product>,
}

#[derive(Debug)]
pub struct CartContext {
    api: ApiClient,
    snapshot: RwLock<Snapshot>,
}

impl CartContext {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            snapshot: RwLock::new(Snapshot::default()),
        }
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn state(&self) -> &LocalState {
        self.api.state()
    }

    /// User mode when a session with a token is stored, guest otherwise.
    #[must_use]
    pub fn mode(&self) -> Mode {
        if self.state().session().is_some() {
            Mode::User
        } else {
            Mode::Guest
        }
    }

    /// Counts from the most recent refresh.
    #[must_use]
    pub fn counts(&self) -> CartCounts {
        self.read(|s| s.counts)
    }

    /// Server cart as of the most recent successful fetch.
    #[must_use]
    pub fn cached_server_cart(&self) -> Vec<CartLine> {
        self.read(|s| s.server_cart.clone())
    }

    #[must_use]
    pub fn cached_wishlist(&self) -> Vec<Product> {
        self.read(|s| s.wishlist.clone())
    }

    /// Adds `quantity` of `product` to the cart for the current mode.
    ///
    /// Guest mode writes the local cart and returns [`AddOutcome::LocalOnly`].
    /// User mode posts to the server without touching the cache and returns
    /// [`AddOutcome::ServerConfirmed`]. Counts are recomputed afterwards.
    ///
    /// # Errors
    ///
    /// Storage failures in guest mode; any [`ApiClient::add_to_cart`] error in
    /// user mode. On error, cached state is left as it was.
    pub async fn add_to_cart(
        &self,
        product: &ProductRef,
        quantity: u32,
    ) -> Result<AddOutcome, ClientError> {
        let outcome = match self.mode() {
            Mode::Guest => {
                let mut cart = self.state().guest_cart();
                let now = cart.add(product.clone(), quantity);
                self.state().save_guest_cart(&cart)?;
                tracing::debug!(product_id = %product.id, quantity = now, "guest cart updated");
                AddOutcome::LocalOnly
            }
            Mode::User => {
                self.api
                    .add_to_cart(&product.id, quantity.max(1))
                    .await
                    .inspect_err(|e| {
                        tracing::warn!(product_id = %product.id, error = %e, "add to cart failed");
                    })?;
                AddOutcome::ServerConfirmed
            }
        };
        self.refresh_counts().await;
        Ok(outcome)
    }

    /// Signs in, stores the session, and merges the guest cart once.
    ///
    /// # Errors
    ///
    /// Login failures, [`ClientError::MissingToken`] when the response has
    /// no usable token, or a storage error while saving the session. Merge
    /// failures are reported in the [`MergeReport`], not as errors.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(Session, MergeReport), ClientError> {
        let session = self.api.login(email, password).await?;
        self.start_session(session).await
    }

    /// Creates an account and continues exactly as [`CartContext::login`].
    ///
    /// # Errors
    ///
    /// As for [`CartContext::login`].
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(Session, MergeReport), ClientError> {
        let session = self.api.register(name, email, password).await?;
        self.start_session(session).await
    }

    async fn start_session(&self, session: Session) -> Result<(Session, MergeReport), ClientError> {
        if !session.is_authenticated() {
            tracing::warn!("sign-in response had a blank token; not saving session");
            return Err(ClientError::MissingToken);
        }
        self.state().save_session(&session)?;
        tracing::info!(role = %session.role, "signed in");
        let report = self.merge_guest_cart().await;
        Ok((session, report))
    }

    /// Signs out and recounts from the guest cart.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the session cannot be removed.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.state().clear_session()?;
        self.write(|s| *s = Snapshot::default());
        tracing::info!("signed out");
        self.refresh_counts().await;
        Ok(())
    }

    /// Sends every guest cart line to the server, then clears the guest cart.
    ///
    /// All lines are posted at once and awaited together. A line the server
    /// rejects is logged and dropped; the guest cart is cleared whatever the
    /// outcome, and counts are refreshed exactly once afterwards.
    ///
    /// In guest mode there is nowhere to merge into, so nothing is sent or
    /// cleared.
    pub async fn merge_guest_cart(&self) -> MergeReport {
        if self.mode() == Mode::Guest {
            tracing::debug!("no session; skipping guest cart merge");
            return MergeReport::default();
        }

        let lines = self.state().guest_cart().into_lines();
        let mut report = MergeReport {
            attempted: lines.len(),
            failed: 0,
        };

        if !lines.is_empty() {
            let results = join_all(
                lines
                    .iter()
                    .map(|line| self.api.add_to_cart(&line.product.id, line.effective_quantity())),
            )
            .await;

            for (line, result) in lines.iter().zip(results) {
                if let Err(e) = result {
                    report.failed += 1;
                    tracing::warn!(
                        product_id = %line.product.id,
                        quantity = line.effective_quantity(),
                        error = %e,
                        "guest cart line was not merged"
                    );
                }
            }
            tracing::info!(
                attempted = report.attempted,
                failed = report.failed,
                "guest cart merged"
            );
        }

        if let Err(e) = self.state().clear_guest_cart() {
            tracing::warn!(error = %e, "could not clear guest cart after merge");
        }
        self.refresh_counts().await;
        report
    }

    /// Recomputes counts from the authoritative source and returns them.
    ///
    /// Guest mode counts the local cart and reports a wishlist of zero. User
    /// mode fetches cart and wishlist from the server; a part that fails to
    /// fetch keeps its previous value.
    pub async fn refresh_counts(&self) -> CartCounts {
        match self.mode() {
            Mode::Guest => {
                let cart = self.state().guest_cart().count();
                self.write(|s| {
                    s.counts = CartCounts { cart, wishlist: 0 };
                    s.server_cart.clear();
                    s.wishlist.clear();
                });
            }
            Mode::User => {
                let (cart, wishlist) =
                    tokio::join!(self.api.fetch_cart(), self.api.fetch_wishlist());
                match cart {
                    Ok(lines) => self.store_server_cart(lines),
                    Err(e) => tracing::warn!(error = %e, "cart refresh failed"),
                }
                match wishlist {
                    Ok(items) => self.store_wishlist(items),
                    Err(e) => tracing::warn!(error = %e, "wishlist refresh failed"),
                }
            }
        }
        self.counts()
    }

    /// Current cart lines: the guest cart, or a fresh server fetch.
    ///
    /// # Errors
    ///
    /// Any [`ApiClient::fetch_cart`] error in user mode; the cache is kept.
    pub async fn cart_lines(&self) -> Result<Vec<CartLine>, ClientError> {
        match self.mode() {
            Mode::Guest => Ok(self.state().guest_cart().into_lines()),
            Mode::User => {
                let lines = self.api.fetch_cart().await?;
                self.store_server_cart(lines.clone());
                Ok(lines)
            }
        }
    }

    /// The wishlist. Always empty for guests.
    ///
    /// # Errors
    ///
    /// Any [`ApiClient::fetch_wishlist`] error in user mode; the cache is kept.
    pub async fn wishlist(&self) -> Result<Vec<Product>, ClientError> {
        match self.mode() {
            Mode::Guest => Ok(Vec::new()),
            Mode::User => {
                let items = self.api.fetch_wishlist().await?;
                self.store_wishlist(items.clone());
                Ok(items)
            }
        }
    }

    /// Adds a product to the server wishlist.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotAuthenticated`] for guests, otherwise any
    /// [`ApiClient::add_to_wishlist`] error.
    pub async fn add_to_wishlist(&self, product_id: &str) -> Result<(), ClientError> {
        if self.mode() == Mode::Guest {
            return Err(ClientError::NotAuthenticated);
        }
        self.api.add_to_wishlist(product_id).await?;
        self.refresh_counts().await;
        Ok(())
    }

    fn store_server_cart(&self, lines: Vec<CartLine>) {
        self.write(|s| {
            s.counts.cart = total_quantity(&lines);
            s.server_cart = lines;
        });
    }

    fn store_wishlist(&self, items: Vec<Product>) {
        self.write(|s| {
            s.counts.wishlist = u32::try_from(items.len()).unwrap_or(u32::MAX);
            s.wishlist = items;
        });
    }

    fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> T {
        let guard = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write(&self, f: impl FnOnce(&mut Snapshot)) {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}
