// Copyright (c) 2025 - Cowboy AI, Inc.
//! Source branches: the displayed source and the paginated source list

use std::sync::Arc;

use super::branch::{Branch, Loadable, PanelStatus};
use crate::action::Action;
use crate::model::{ObjId, Source, SourcePage};

/// The source currently displayed by the source page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentSourceBranch {
    /// Identifier the route last asked for
    pub requested: Option<ObjId>,
    /// Displayed source
    pub source: Option<Arc<Source>>,
    /// A fetch for `requested` is outstanding
    pub loading: bool,
    /// Failure of the last fetch for `requested`
    pub load_error: Option<String>,
}

impl CurrentSourceBranch {
    /// Identifier of the displayed source
    pub fn displayed_id(&self) -> Option<&ObjId> {
        self.source.as_ref().map(|s| &s.id)
    }

    /// Panel status for the source page
    pub fn status(&self) -> PanelStatus {
        if self.loading {
            PanelStatus::Loading
        } else if self.load_error.is_some() {
            PanelStatus::LoadFailed
        } else if self.source.is_some() && self.displayed_id() == self.requested.as_ref() {
            PanelStatus::Loaded
        } else {
            PanelStatus::Loading
        }
    }

    fn is_requested(&self, obj_id: &ObjId) -> bool {
        self.requested.as_ref() == Some(obj_id)
    }

    fn accepts(&self, incoming: &Source) -> bool {
        match &self.source {
            Some(current) if current.id == incoming.id => current.superseded_by(incoming),
            _ => true,
        }
    }
}

impl Branch for CurrentSourceBranch {
    const NAME: &'static str = "currentSource";

    fn reduce(&self, action: &Action) -> Option<Self> {
        match action {
            Action::FetchSource { obj_id } => Some(Self {
                requested: Some(obj_id.clone()),
                source: self.source.clone(),
                loading: true,
                load_error: None,
            }),

            // Responses for an identifier the route has moved away from are stale
            Action::FetchSourceOk { obj_id, source } if self.is_requested(obj_id) => {
                let source = if self.accepts(source) {
                    Some(Arc::new(source.clone()))
                } else {
                    self.source.clone()
                };
                Some(Self {
                    requested: self.requested.clone(),
                    source,
                    loading: false,
                    load_error: None,
                })
            }

            Action::FetchSourceFail { obj_id, message } if self.is_requested(obj_id) => {
                Some(Self {
                    load_error: Some(message.clone()),
                    loading: false,
                    ..self.clone()
                })
            }

            Action::SourceUpdated { source } => {
                let displayed = self.displayed_id()?;
                if displayed != &source.id || !self.accepts(source) {
                    return None;
                }
                Some(Self {
                    source: Some(Arc::new(source.clone())),
                    ..self.clone()
                })
            }

            Action::CommentAdded { obj_id, comment } => {
                let current = self.source.as_ref()?;
                if &current.id != obj_id || current.comments.iter().any(|c| c.id == comment.id) {
                    return None;
                }
                let mut updated = Source::clone(current);
                updated.comments.push(comment.clone());
                Some(Self {
                    source: Some(Arc::new(updated)),
                    ..self.clone()
                })
            }

            _ => None,
        }
    }
}

/// One page of the source list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceListBranch {
    /// Page the list view last asked for
    pub requested_page: Option<u32>,
    /// Loaded page
    pub page: Loadable<Arc<SourcePage>>,
}

impl Branch for SourceListBranch {
    const NAME: &'static str = "sourceList";

    fn reduce(&self, action: &Action) -> Option<Self> {
        match action {
            Action::FetchSources { page_number } => Some(Self {
                requested_page: Some(*page_number),
                page: self.page.pending(),
            }),

            Action::FetchSourcesOk { page } if self.requested_page == Some(page.page_number) => {
                Some(Self {
                    requested_page: self.requested_page,
                    page: Loadable::loaded(Arc::new(page.clone())),
                })
            }

            Action::FetchSourcesFail {
                page_number,
                message,
            } if self.requested_page == Some(*page_number) => Some(Self {
                requested_page: self.requested_page,
                page: self.page.failed(message.clone()),
            }),

            Action::SourceUpdated { source } => {
                let page = self.page.data.as_ref()?;
                let index = page.sources.iter().position(|s| s.id == source.id)?;
                if !page.sources[index].superseded_by(source) {
                    return None;
                }
                let mut updated = SourcePage::clone(page);
                updated.sources[index] = source.clone();
                Some(Self {
                    requested_page: self.requested_page,
                    page: Loadable {
                        data: Some(Arc::new(updated)),
                        ..self.page.clone()
                    },
                })
            }

            _ => None,
        }
    }
}
