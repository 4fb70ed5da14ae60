use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use lru::LruCache;
use parking_lot::{Mutex, RwLock};

use crate::alerts::AlertStore;
use crate::error::CoreError;
use crate::sessions::RecitationSession;
use crate::students::{AssignmentId, StudentCurriculum, StudentId, StudentPlanProgress};
use crate::tracking::ContentAssignment;

/// Engine-wide mutable state container.
/// All mutable records are centralized here and passed explicitly to the
/// engine, which eliminates global mutable state and lock-ordering hazards.
#[derive(Clone)]
pub struct EngineState {
    /// Active curriculum assignment per student
    pub assignments: Arc<RwLock<HashMap<StudentId, StudentCurriculum>>>,
    /// Per-plan progress rows, keyed by owning assignment
    pub progress: Arc<RwLock<HashMap<AssignmentId, Vec<StudentPlanProgress>>>>,
    /// Append-only recitation log per student
    pub sessions: Arc<RwLock<HashMap<StudentId, Vec<RecitationSession>>>>,
    /// Alert records and their state machine
    pub alerts: Arc<AlertStore>,
    /// Daily content cache (LRU with bounded size)
    pub content_cache: Arc<RwLock<LruCache<(StudentId, NaiveDate), ContentAssignment>>>,
    /// Per-student mutexes serializing writes for one student
    student_locks: Arc<RwLock<HashMap<StudentId, Arc<Mutex<()>>>>>,
    next_assignment_id: Arc<AtomicU64>,
    next_progress_id: Arc<AtomicU64>,
}

impl EngineState {
    pub fn new() -> Self {
        EngineState {
            assignments: Arc::new(RwLock::new(HashMap::new())),
            progress: Arc::new(RwLock::new(HashMap::new())),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            alerts: Arc::new(AlertStore::new()),
            content_cache: Arc::new(RwLock::new(LruCache::new(
                NonZeroUsize::new(1024).expect("1024 > 0"),
            ))),
            student_locks: Arc::new(RwLock::new(HashMap::new())),
            next_assignment_id: Arc::new(AtomicU64::new(1)),
            next_progress_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Mutex guarding one student's mutable records. Evaluations for
    /// different students proceed concurrently; two writers for the same
    /// student serialize here.
    pub fn student_lock(&self, student_id: StudentId) -> Arc<Mutex<()>> {
        let mut locks = self.student_locks.write();
        locks
            .entry(student_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub fn allocate_assignment_id(&self) -> u64 {
        self.next_assignment_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn allocate_progress_id(&self) -> u64 {
        self.next_progress_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn assignment(&self, student_id: StudentId) -> Option<StudentCurriculum> {
        self.assignments.read().get(&student_id).cloned()
    }

    pub fn active_assignment(&self, student_id: StudentId) -> Result<StudentCurriculum, CoreError> {
        self.assignment(student_id)
            .ok_or_else(|| CoreError::not_found("assignment", student_id))
    }

    pub fn put_assignment(&self, assignment: StudentCurriculum) {
        self.assignments
            .write()
            .insert(assignment.student_id, assignment);
    }

    pub fn update_assignment<F>(
        &self,
        student_id: StudentId,
        f: F,
    ) -> Result<StudentCurriculum, CoreError>
    where
        F: FnOnce(&mut StudentCurriculum),
    {
        let mut assignments = self.assignments.write();
        let assignment = assignments
            .get_mut(&student_id)
            .ok_or_else(|| CoreError::not_found("assignment", student_id))?;
        f(assignment);
        Ok(assignment.clone())
    }

    pub fn push_session(&self, session: RecitationSession) {
        self.sessions
            .write()
            .entry(session.student_id)
            .or_default()
            .push(session);
    }

    pub fn sessions_for(&self, student_id: StudentId) -> Vec<RecitationSession> {
        self.sessions
            .read()
            .get(&student_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn update_session<F>(
        &self,
        student_id: StudentId,
        session_id: &str,
        f: F,
    ) -> Result<RecitationSession, CoreError>
    where
        F: FnOnce(&mut RecitationSession) -> Result<(), CoreError>,
    {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(&student_id)
            .and_then(|list| list.iter_mut().find(|s| s.session_id == session_id))
            .ok_or_else(|| CoreError::not_found("session", session_id))?;
        f(session)?;
        Ok(session.clone())
    }

    pub fn progress_rows(&self, assignment_id: AssignmentId) -> Vec<StudentPlanProgress> {
        self.progress
            .read()
            .get(&assignment_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn cached_content(
        &self,
        student_id: StudentId,
        date: NaiveDate,
    ) -> Option<ContentAssignment> {
        self.content_cache.write().get(&(student_id, date)).cloned()
    }

    pub fn cache_content(&self, content: ContentAssignment) {
        self.content_cache
            .write()
            .put((content.student_id, content.date), content);
    }

    /// Drop cached content for the given days; used when a transition resets
    /// the student's position.
    pub fn invalidate_content(&self, student_id: StudentId, dates: &[NaiveDate]) {
        let mut cache = self.content_cache.write();
        for &date in dates {
            cache.pop(&(student_id, date));
        }
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}
