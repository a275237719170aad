use std::sync::Arc;

use super::*;
use async_trait::async_trait;
use reqwest::StatusCode;
use shared::{
    domain::{StudentId, SubjectId},
    protocol::{WriteOperation, WritePayload},
};
use tokio::sync::Mutex;

use crate::notice::NoticeCategory;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    List,
    Create(Record),
    Update(Record),
    Remove(RecordId),
}

/// In-memory backend that assigns ids and records every call it receives.
#[derive(Default)]
struct FakeGateway {
    stored: Mutex<Vec<Record>>,
    calls: Mutex<Vec<Call>>,
    next_id: Mutex<i64>,
    fail_list: Mutex<bool>,
    fail_writes: Mutex<bool>,
}

impl FakeGateway {
    fn seeded(records: Vec<Record>) -> Arc<Self> {
        let next = records
            .iter()
            .filter_map(|r| r.id.map(|id| id.0))
            .max()
            .unwrap_or(0);
        Arc::new(Self {
            stored: Mutex::new(records),
            next_id: Mutex::new(next),
            ..Self::default()
        })
    }

    async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    async fn set_fail_list(&self, fail: bool) {
        *self.fail_list.lock().await = fail;
    }

    async fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().await = fail;
    }

    async fn check_writes(&self, endpoint: &str) -> Result<(), GatewayError> {
        if *self.fail_writes.lock().await {
            return Err(backend_error(endpoint));
        }
        Ok(())
    }

    fn receipt(operation: WriteOperation) -> WriteReceipt {
        WriteReceipt {
            operation,
            status: 200,
            payload: WritePayload::Empty,
        }
    }
}

fn backend_error(endpoint: &str) -> GatewayError {
    GatewayError::Status {
        endpoint: endpoint.to_string(),
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "database unavailable".into(),
    }
}

#[async_trait]
impl RecordGateway for FakeGateway {
    async fn list(&self) -> Result<Vec<Record>, GatewayError> {
        self.calls.lock().await.push(Call::List);
        if *self.fail_list.lock().await {
            return Err(backend_error("getPromedios"));
        }
        Ok(self.stored.lock().await.clone())
    }

    async fn create(&self, record: &Record) -> Result<WriteReceipt, GatewayError> {
        self.calls.lock().await.push(Call::Create(record.clone()));
        self.check_writes("insertPromedios").await?;
        let mut next_id = self.next_id.lock().await;
        *next_id += 1;
        let stored = record.clone().with_id(RecordId(*next_id));
        self.stored.lock().await.push(stored);
        Ok(Self::receipt(WriteOperation::Create))
    }

    async fn update(&self, record: &Record) -> Result<WriteReceipt, GatewayError> {
        self.calls.lock().await.push(Call::Update(record.clone()));
        self.check_writes("updatePromedios").await?;
        let mut stored = self.stored.lock().await;
        if let Some(slot) = stored.iter_mut().find(|r| r.id == record.id) {
            *slot = record.clone();
        }
        Ok(Self::receipt(WriteOperation::Update))
    }

    async fn remove(&self, id: RecordId) -> Result<WriteReceipt, GatewayError> {
        self.calls.lock().await.push(Call::Remove(id));
        self.check_writes("deletePromedios").await?;
        self.stored.lock().await.retain(|r| r.id != Some(id));
        Ok(Self::receipt(WriteOperation::Remove))
    }
}

struct ScriptedConfirm {
    answer: bool,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConfirm {
    fn answering(answer: bool) -> (Self, Arc<Mutex<Vec<String>>>) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                answer,
                prompts: Arc::clone(&prompts),
            },
            prompts,
        )
    }
}

#[async_trait]
impl Confirm for ScriptedConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().await.push(prompt.to_string());
        self.answer
    }
}

fn sample(id: i64) -> Record {
    Record::new(StudentId(5), SubjectId(2), [4.0, 5.0, 3.0]).with_id(RecordId(id))
}

fn controller(
    gateway: &Arc<FakeGateway>,
) -> RecordListController<Arc<FakeGateway>, crate::confirm::AlwaysConfirm> {
    RecordListController::new(Arc::clone(gateway), crate::confirm::AlwaysConfirm)
}

#[tokio::test]
async fn refresh_replaces_records_with_server_collection() {
    let gateway = FakeGateway::seeded(vec![sample(1)]);
    let mut ctl = controller(&gateway);
    assert!(ctl.records().is_empty());

    ctl.refresh().await.expect("refresh");

    assert_eq!(ctl.records(), &[sample(1)]);
}

#[tokio::test]
async fn refresh_is_a_full_replace_in_server_order() {
    let gateway = FakeGateway::seeded(vec![sample(3), sample(1), sample(2)]);
    let mut ctl = controller(&gateway);
    ctl.load().await.expect("load");

    gateway.stored.lock().await.retain(|r| r.id != Some(RecordId(1)));
    ctl.refresh().await.expect("refresh");

    let ids: Vec<_> = ctl.records().iter().filter_map(|r| r.id).collect();
    assert_eq!(ids, vec![RecordId(3), RecordId(2)]);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_records_and_raises_notice() {
    let gateway = FakeGateway::seeded(vec![sample(1)]);
    let mut ctl = controller(&gateway);
    ctl.refresh().await.expect("refresh");

    gateway.set_fail_list(true).await;
    let err = ctl.refresh().await.expect_err("must fail");

    assert!(matches!(err, GatewayError::Status { .. }));
    assert_eq!(ctl.records(), &[sample(1)]);
    let notice = ctl.notice().expect("notice");
    assert_eq!(notice.context(), NoticeContext::Refresh);
    assert_eq!(notice.category(), NoticeCategory::Backend);

    gateway.set_fail_list(false).await;
    ctl.refresh().await.expect("refresh");
    assert!(ctl.notice().is_none());
}

#[tokio::test]
async fn cancel_edit_always_returns_to_blank_create_mode() {
    let gateway = FakeGateway::seeded(Vec::new());
    let mut ctl = controller(&gateway);

    ctl.cancel_edit();
    assert!(!ctl.is_editing());
    assert_eq!(ctl.draft(), &Record::blank());

    ctl.begin_edit(&sample(4));
    ctl.draft_mut().score2 = 1.0;
    ctl.cancel_edit();
    assert!(!ctl.is_editing());
    assert_eq!(ctl.draft(), &Record::blank());
}

#[tokio::test]
async fn begin_edit_copies_record_by_value() {
    let gateway = FakeGateway::seeded(vec![sample(1)]);
    let mut ctl = controller(&gateway);
    ctl.refresh().await.expect("refresh");

    let listed = ctl.records()[0].clone();
    ctl.begin_edit(&listed);
    assert!(ctl.is_editing());
    assert_eq!(ctl.draft(), &listed);

    ctl.draft_mut().score1 = 0.5;
    ctl.draft_mut().student_id = StudentId(99);

    assert_eq!(listed, sample(1));
    assert_eq!(ctl.records(), &[sample(1)]);
}

#[tokio::test]
async fn save_in_create_mode_creates_blanks_draft_and_refreshes() {
    let gateway = FakeGateway::seeded(Vec::new());
    let mut ctl = controller(&gateway);
    let draft = Record::new(StudentId(5), SubjectId(2), [4.0, 5.0, 3.0]);
    *ctl.draft_mut() = draft.clone();

    let receipt = ctl.save().await.expect("save");

    assert_eq!(receipt.operation, WriteOperation::Create);
    assert_eq!(gateway.calls().await, vec![Call::Create(draft), Call::List]);
    assert_eq!(ctl.draft(), &Record::blank());
    assert!(!ctl.is_editing());
    assert_eq!(ctl.records().len(), 1);
    assert_eq!(ctl.records()[0].id, Some(RecordId(1)));
}

#[tokio::test]
async fn save_in_edit_mode_updates_instead_of_creating() {
    let original = Record::new(StudentId(1), SubjectId(1), [1.0, 1.0, 1.0]).with_id(RecordId(7));
    let gateway = FakeGateway::seeded(vec![original.clone()]);
    let mut ctl = controller(&gateway);

    ctl.begin_edit(&original);
    assert!(ctl.is_editing());
    assert_eq!(ctl.draft().id, Some(RecordId(7)));
    ctl.draft_mut().score3 = 5.0;
    let edited = ctl.draft().clone();

    let receipt = ctl.save().await.expect("save");

    assert_eq!(receipt.operation, WriteOperation::Update);
    let calls = gateway.calls().await;
    assert_eq!(calls, vec![Call::Update(edited.clone()), Call::List]);
    assert!(!calls.iter().any(|c| matches!(c, Call::Create(_))));
    assert!(!ctl.is_editing());
    assert_eq!(ctl.draft(), &Record::blank());
    assert_eq!(ctl.records(), &[edited]);
}

#[tokio::test]
async fn failed_save_keeps_draft_and_mode_for_retry() {
    let original = sample(2);
    let gateway = FakeGateway::seeded(vec![original.clone()]);
    let mut ctl = controller(&gateway);
    ctl.refresh().await.expect("refresh");
    ctl.begin_edit(&original);
    gateway.set_fail_writes(true).await;

    let err = ctl.save().await.expect_err("must fail");

    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert!(ctl.is_editing());
    assert_eq!(ctl.draft(), &original);
    assert_eq!(ctl.notice().map(Notice::context), Some(NoticeContext::Save));
    assert_eq!(
        gateway.calls().await,
        vec![Call::List, Call::Update(original)]
    );
}

#[tokio::test]
async fn save_in_edit_mode_without_id_is_rejected_locally() {
    let gateway = FakeGateway::seeded(vec![sample(1)]);
    let mut ctl = controller(&gateway);

    for draft in [
        Record::new(StudentId(3), SubjectId(4), [2.0, 2.0, 2.0]),
        Record::new(StudentId(3), SubjectId(4), [2.0, 2.0, 2.0]).with_id(RecordId(0)),
    ] {
        ctl.begin_edit(&draft);

        let err = ctl.save().await.expect_err("must fail");

        assert!(matches!(err, GatewayError::MissingId));
        let notice = ctl.notice().expect("notice");
        assert_eq!(notice.context(), NoticeContext::Save);
        assert_eq!(notice.category(), NoticeCategory::Validation);
        assert!(ctl.is_editing());
        assert_eq!(ctl.draft(), &draft);
    }

    assert!(gateway.calls().await.is_empty());
}

#[tokio::test]
async fn save_reports_write_even_when_follow_up_refresh_fails() {
    let gateway = FakeGateway::seeded(Vec::new());
    let mut ctl = controller(&gateway);
    *ctl.draft_mut() = Record::new(StudentId(8), SubjectId(3), [2.0, 3.0, 4.0]);
    gateway.set_fail_list(true).await;

    let receipt = ctl.save().await.expect("write succeeded");

    assert_eq!(receipt.operation, WriteOperation::Create);
    assert_eq!(ctl.draft(), &Record::blank());
    assert!(ctl.records().is_empty());
    let notice = ctl.take_notice().expect("notice");
    assert_eq!(notice.context(), NoticeContext::Refresh);
    assert!(ctl.notice().is_none());
}

#[tokio::test]
async fn delete_without_usable_id_never_calls_backend() {
    let gateway = FakeGateway::seeded(vec![sample(1)]);
    let (confirm, prompts) = ScriptedConfirm::answering(true);
    let mut ctl = RecordListController::new(Arc::clone(&gateway), confirm);

    assert_eq!(
        ctl.delete_record(None).await.expect("skip"),
        DeleteOutcome::Skipped
    );
    assert_eq!(
        ctl.delete_record(Some(RecordId(0))).await.expect("skip"),
        DeleteOutcome::Skipped
    );

    assert!(gateway.calls().await.is_empty());
    assert!(prompts.lock().await.is_empty());
}

#[tokio::test]
async fn declined_delete_changes_nothing() {
    let gateway = FakeGateway::seeded(vec![sample(1)]);
    let (confirm, prompts) = ScriptedConfirm::answering(false);
    let mut ctl = RecordListController::new(Arc::clone(&gateway), confirm);
    ctl.refresh().await.expect("refresh");

    let outcome = ctl.delete_record(Some(RecordId(1))).await.expect("delete");

    assert_eq!(outcome, DeleteOutcome::Declined);
    assert_eq!(prompts.lock().await.as_slice(), [DELETE_PROMPT.to_string()]);
    assert_eq!(gateway.calls().await, vec![Call::List]);
    assert_eq!(ctl.records(), &[sample(1)]);
}

#[tokio::test]
async fn confirmed_delete_removes_and_refreshes() {
    let gateway = FakeGateway::seeded(vec![sample(1), sample(2)]);
    let (confirm, _prompts) = ScriptedConfirm::answering(true);
    let mut ctl = RecordListController::new(Arc::clone(&gateway), confirm);
    ctl.refresh().await.expect("refresh");

    let outcome = ctl.delete_record(Some(RecordId(1))).await.expect("delete");

    assert!(matches!(
        outcome,
        DeleteOutcome::Removed(WriteReceipt {
            operation: WriteOperation::Remove,
            ..
        })
    ));
    assert_eq!(
        gateway.calls().await,
        vec![Call::List, Call::Remove(RecordId(1)), Call::List]
    );
    assert_eq!(ctl.records(), &[sample(2)]);
}

#[tokio::test]
async fn failed_delete_leaves_list_untouched() {
    let gateway = FakeGateway::seeded(vec![sample(1)]);
    let mut ctl = controller(&gateway);
    ctl.refresh().await.expect("refresh");
    gateway.set_fail_writes(true).await;

    ctl.delete_record(Some(RecordId(1)))
        .await
        .expect_err("must fail");

    assert_eq!(ctl.records(), &[sample(1)]);
    assert_eq!(ctl.notice().map(Notice::context), Some(NoticeContext::Delete));
    assert_eq!(
        gateway.calls().await,
        vec![Call::List, Call::Remove(RecordId(1))]
    );
}
