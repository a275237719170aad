//! List/draft state kept in step with the remote record collection.
//!
//! Every write is followed by a full refresh, so `records` always mirrors the
//! last list response that arrived. Failures leave prior state untouched and
//! are kept as a [`Notice`] for the view to show.

use shared::{
    domain::RecordId,
    protocol::{Record, WriteReceipt},
};
use tracing::{debug, info, warn};

use crate::{
    confirm::{Confirm, DELETE_PROMPT},
    error::GatewayError,
    gateway::RecordGateway,
    notice::{Notice, NoticeContext},
};

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// No usable id was given; nothing was asked or sent.
    Skipped,
    Declined,
    Removed(WriteReceipt),
}

pub struct RecordListController<G, C> {
    gateway: G,
    confirmer: C,
    records: Vec<Record>,
    draft: Record,
    is_editing: bool,
    notice: Option<Notice>,
}

impl<G, C> RecordListController<G, C>
where
    G: RecordGateway,
    C: Confirm,
{
    pub fn new(gateway: G, confirmer: C) -> Self {
        Self {
            gateway,
            confirmer,
            records: Vec::new(),
            draft: Record::blank(),
            is_editing: false,
            notice: None,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn draft(&self) -> &Record {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Record {
        &mut self.draft
    }

    pub fn is_editing(&self) -> bool {
        self.is_editing
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Initial population when a view is first shown.
    pub async fn load(&mut self) -> Result<(), GatewayError> {
        self.refresh().await
    }

    pub async fn refresh(&mut self) -> Result<(), GatewayError> {
        match self.gateway.list().await {
            Ok(records) => {
                info!(count = records.len(), "records refreshed");
                self.records = records;
                self.notice = None;
                Ok(())
            }
            Err(err) => Err(self.fail(NoticeContext::Refresh, err)),
        }
    }

    /// Creates or updates the draft depending on edit mode, then refreshes.
    ///
    /// The returned receipt describes the write. A failed follow-up refresh
    /// does not undo a successful write; it only leaves a notice behind.
    pub async fn save(&mut self) -> Result<WriteReceipt, GatewayError> {
        if self.is_editing && !self.draft.is_persisted() {
            return Err(self.fail(NoticeContext::Save, GatewayError::MissingId));
        }

        let result = if self.is_editing {
            self.gateway.update(&self.draft).await
        } else {
            self.gateway.create(&self.draft).await
        };

        let receipt = match result {
            Ok(receipt) => receipt,
            Err(err) => return Err(self.fail(NoticeContext::Save, err)),
        };
        debug!(operation = ?receipt.operation, status = receipt.status, "draft saved");

        if self.is_editing {
            self.cancel_edit();
        } else {
            self.draft = Record::blank();
        }
        self.notice = None;
        self.refresh_after_write().await;
        Ok(receipt)
    }

    pub fn begin_edit(&mut self, record: &Record) {
        self.draft = record.clone();
        self.is_editing = true;
    }

    pub fn cancel_edit(&mut self) {
        self.is_editing = false;
        self.draft = Record::blank();
    }

    pub async fn delete_record(
        &mut self,
        id: Option<RecordId>,
    ) -> Result<DeleteOutcome, GatewayError> {
        let Some(id) = id.filter(|id| id.is_assigned()) else {
            return Ok(DeleteOutcome::Skipped);
        };

        if !self.confirmer.confirm(DELETE_PROMPT).await {
            debug!(id = id.0, "delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        let receipt = match self.gateway.remove(id).await {
            Ok(receipt) => receipt,
            Err(err) => return Err(self.fail(NoticeContext::Delete, err)),
        };
        info!(id = id.0, "record removed");

        self.notice = None;
        self.refresh_after_write().await;
        Ok(DeleteOutcome::Removed(receipt))
    }

    async fn refresh_after_write(&mut self) {
        if let Err(err) = self.refresh().await {
            warn!(%err, "refresh after write failed; list may be stale");
        }
    }

    fn fail(&mut self, context: NoticeContext, err: GatewayError) -> GatewayError {
        warn!(?context, %err, "record operation failed");
        self.notice = Some(Notice::from_gateway_error(context, &err));
        err
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
