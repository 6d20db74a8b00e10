use std::collections::HashSet;

use crate::models::{
    AccessCounts, AccessSnapshot, ContentType, GrantSets, ResolvedAccess, Subject,
};

/// Access Resolver
///
/// Pure projection from (subject, grants, content) to the per-user visibility
/// view. There is no mutation and no caching: grant volume is small (low
/// thousands at most), so the view is recomputed eagerly from a fresh
/// snapshot on every read rather than maintained incrementally.
///
/// Dangling references are tolerated by design: the membership test is by
/// category id, never by resolved Category record, so a grant pointing at a
/// deleted category still counts toward tab availability, and an item whose
/// category vanished is still visible to holders of a grant for that id.

/// granted_category_ids
///
/// The set of category ids granted to `subject` for one content type. A set,
/// not a list: duplicate grant rows, should they ever occur, must not
/// duplicate visible content.
pub fn granted_category_ids(grants: &GrantSets, ty: ContentType, subject: i64) -> HashSet<i64> {
    grants
        .get(ty)
        .iter()
        .filter(|g| g.user_id == subject)
        .map(|g| g.category_id)
        .collect()
}

/// resolve
///
/// Computes the full per-subject view: six filtered content lists (stored
/// order preserved, each matching item exactly once), the available tabs in
/// fixed precedence order, and per-type granted-category counts.
///
/// An unauthenticated subject (`None`) resolves to the empty view.
pub fn resolve(subject: Option<i64>, snapshot: &AccessSnapshot) -> ResolvedAccess {
    let Some(user_id) = subject else {
        return ResolvedAccess::default();
    };

    let mut counts = AccessCounts::default();
    let mut available_tabs = Vec::new();

    for ty in ContentType::TAB_ORDER {
        let granted = granted_category_ids(&snapshot.grants, ty, user_id);
        counts.set(ty, granted.len());
        // A grant with zero matching items still surfaces its tab: the user
        // was given the category, the category just has no content yet.
        if !granted.is_empty() {
            available_tabs.push(ty.tab_id().to_string());
        }
    }

    let lib = &snapshot.library;
    let keep = |ty: ContentType| granted_category_ids(&snapshot.grants, ty, user_id);

    let audio_ids = keep(ContentType::Audio);
    let audio_cloud_ids = keep(ContentType::AudioCloud);
    let pdf_ids = keep(ContentType::Pdf);
    let pdf_cloud_ids = keep(ContentType::PdfCloud);
    let video_ids = keep(ContentType::Video);
    let file_cloud_ids = keep(ContentType::FileCloud);

    ResolvedAccess {
        audio: lib
            .audio
            .iter()
            .filter(|i| audio_ids.contains(&i.category_id))
            .cloned()
            .collect(),
        audio_cloud: lib
            .audio_cloud
            .iter()
            .filter(|i| audio_cloud_ids.contains(&i.category_id))
            .cloned()
            .collect(),
        pdf: lib
            .pdf
            .iter()
            .filter(|i| pdf_ids.contains(&i.category_id))
            .cloned()
            .collect(),
        pdf_cloud: lib
            .pdf_cloud
            .iter()
            .filter(|i| pdf_cloud_ids.contains(&i.category_id))
            .cloned()
            .collect(),
        video: lib
            .video
            .iter()
            .filter(|i| video_ids.contains(&i.category_id))
            .cloned()
            .collect(),
        file_cloud: lib
            .file_cloud
            .iter()
            .filter(|i| file_cloud_ids.contains(&i.category_id))
            .cloned()
            .collect(),
        available_tabs,
        counts,
    }
}

/// full_access
///
/// The unrestricted view held by admins: every item of every type, all six
/// tabs, and per-type counts derived from the category type-hints.
pub fn full_access(snapshot: &AccessSnapshot) -> ResolvedAccess {
    let mut counts = AccessCounts::default();
    for ty in ContentType::TAB_ORDER {
        let n = snapshot
            .categories
            .iter()
            .filter(|c| c.filter_type() == ty)
            .count();
        counts.set(ty, n);
    }

    ResolvedAccess {
        audio: snapshot.library.audio.clone(),
        audio_cloud: snapshot.library.audio_cloud.clone(),
        pdf: snapshot.library.pdf.clone(),
        pdf_cloud: snapshot.library.pdf_cloud.clone(),
        video: snapshot.library.video.clone(),
        file_cloud: snapshot.library.file_cloud.clone(),
        available_tabs: ContentType::TAB_ORDER
            .iter()
            .map(|ty| ty.tab_id().to_string())
            .collect(),
        counts,
    }
}

/// Capability
///
/// The explicit admin-bypass model: an admin subject holds the unrestricted
/// capability, everyone else gets whatever resolution grants them. Branching
/// on this enum replaces scattered `is_admin` checks at render sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Sees everything; the Resolver is bypassed.
    All,
    /// Sees exactly what `resolve` yields for this subject (None when
    /// unauthenticated).
    Resolved(Option<i64>),
}

/// capability_for
///
/// `is_admin` ⇒ the unrestricted capability; otherwise resolution over the
/// subject (or over nobody, when unauthenticated).
pub fn capability_for(subject: Option<&Subject>) -> Capability {
    match subject {
        Some(s) if s.is_admin => Capability::All,
        Some(s) => Capability::Resolved(Some(s.id)),
        None => Capability::Resolved(None),
    }
}

impl Capability {
    /// Materializes the view this capability allows over the given snapshot.
    pub fn view(&self, snapshot: &AccessSnapshot) -> ResolvedAccess {
        match self {
            Capability::All => full_access(snapshot),
            Capability::Resolved(subject) => resolve(*subject, snapshot),
        }
    }
}
