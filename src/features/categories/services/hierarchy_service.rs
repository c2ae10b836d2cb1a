//! Recursive operations over the category parent graph.
//!
//! Every traversal tracks the identifiers it has visited and the depth it has
//! reached, so a corrupted `parent_id` chain (a category that is its own
//! ancestor) ends in an error instead of an endless walk.
//!
//! Consistency: reads are snapshot-free. A category deleted by another caller
//! between two levels is simply not seen. Hard removal is a best-effort
//! cascade, not atomic; see [`CategoryHierarchy::remove_with_descendants`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use uuid::Uuid;

use crate::core::config::HierarchyConfig;
use crate::features::categories::dtos::{BreadcrumbItemDto, CategoryTreeNode};
use crate::features::categories::error::HierarchyError;
use crate::features::categories::models::{
    Category, CategoryFilter, CategoryPatch, CategoryStatus, RemovalMode, UpdateResult,
};
use crate::features::categories::repositories::CategoryRepository;
use crate::shared::cancellation::Cancellation;

pub type HierarchyResult<T> = std::result::Result<T, HierarchyError>;

fn ensure_active(cx: &Cancellation) -> HierarchyResult<()> {
    if cx.is_cancelled() {
        return Err(HierarchyError::Cancelled);
    }
    Ok(())
}

fn assemble(category: Category, children_of: &mut HashMap<Uuid, Vec<Category>>) -> CategoryTreeNode {
    let children = children_of
        .remove(&category.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| assemble(child, children_of))
        .collect();
    CategoryTreeNode::new(category, children)
}

/// Tree assembly, breadcrumbs, descendant counts, cascading removal and flat
/// bulk status updates over a [`CategoryRepository`].
pub struct CategoryHierarchy {
    repo: Arc<dyn CategoryRepository>,
    config: HierarchyConfig,
}

impl CategoryHierarchy {
    pub fn new(repo: Arc<dyn CategoryRepository>, config: HierarchyConfig) -> Self {
        Self { repo, config }
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    /// Fetch a category that has not been soft-deleted
    pub async fn live(&self, id: Uuid) -> HierarchyResult<Category> {
        self.repo
            .find_by_id(id)
            .await?
            .filter(|c| !c.is_deleted)
            .ok_or(HierarchyError::NotFound(id))
    }

    /// Direct children in the order the repository returns them
    /// (`display_order`, then title under the store's collation)
    pub async fn children(
        &self,
        parent: Option<Uuid>,
        include_deleted: bool,
        cx: &Cancellation,
    ) -> HierarchyResult<Vec<Category>> {
        ensure_active(cx)?;
        Ok(self.repo.find_by_parent(parent, include_deleted).await?)
    }

    /// Nested tree of non-deleted categories.
    ///
    /// With `root_id` the result is a single-element forest rooted at that
    /// category; without it, every top-level category is a root.
    pub async fn build_tree(
        &self,
        root_id: Option<Uuid>,
        cx: &Cancellation,
    ) -> HierarchyResult<Vec<CategoryTreeNode>> {
        let roots = match root_id {
            Some(id) => {
                ensure_active(cx)?;
                vec![self.live(id).await?]
            }
            None => self.children(None, false, cx).await?,
        };

        let mut visited: HashSet<Uuid> = roots.iter().map(|r| r.id).collect();
        let mut children_of: HashMap<Uuid, Vec<Category>> = HashMap::new();
        let mut pending: Vec<(Uuid, usize)> = roots.iter().map(|r| (r.id, 1)).collect();

        while let Some((id, depth)) = pending.pop() {
            let children = self.children(Some(id), false, cx).await?;
            if children.is_empty() {
                continue;
            }
            if depth >= self.config.max_depth {
                tracing::warn!(category_id = %id, depth, "Category tree exceeds maximum depth");
                return Err(HierarchyError::CycleOrDepthExceeded {
                    id,
                    max_depth: self.config.max_depth,
                });
            }
            for child in &children {
                if !visited.insert(child.id) {
                    tracing::warn!(category_id = %child.id, parent_id = %id, "Cycle detected while building category tree");
                    return Err(HierarchyError::CycleDetected(child.id));
                }
                pending.push((child.id, depth + 1));
            }
            children_of.insert(id, children);
        }

        tracing::debug!(
            root_id = ?root_id,
            nodes = visited.len(),
            "Category tree assembled"
        );

        Ok(roots
            .into_iter()
            .map(|root| assemble(root, &mut children_of))
            .collect())
    }

    /// Ancestors of a category, root first, excluding the category itself
    pub async fn breadcrumb(
        &self,
        id: Uuid,
        cx: &Cancellation,
    ) -> HierarchyResult<Vec<BreadcrumbItemDto>> {
        ensure_active(cx)?;
        let category = self.live(id).await?;

        let mut visited = HashSet::from([category.id]);
        let mut trail: VecDeque<BreadcrumbItemDto> = VecDeque::new();
        let mut next = category.parent_id;

        while let Some(parent_id) = next {
            if !visited.insert(parent_id) {
                tracing::warn!(category_id = %id, revisited = %parent_id, "Cycle detected while resolving breadcrumb");
                return Err(HierarchyError::CycleDetected(parent_id));
            }
            // The category itself occupies one level
            if trail.len() + 1 >= self.config.max_depth {
                return Err(HierarchyError::CycleOrDepthExceeded {
                    id,
                    max_depth: self.config.max_depth,
                });
            }

            ensure_active(cx)?;
            match self.repo.find_by_id(parent_id).await? {
                Some(parent) => {
                    next = parent.parent_id;
                    trail.push_front(parent.into());
                }
                None => {
                    // Dangling reference: the walk ends here as if it were a root
                    tracing::warn!(category_id = %id, missing_parent = %parent_id, "Breadcrumb parent no longer exists");
                    break;
                }
            }
        }

        Ok(trail.into())
    }

    /// Level of a category in its tree; a root is at depth 1
    pub async fn depth(&self, id: Uuid, cx: &Cancellation) -> HierarchyResult<usize> {
        Ok(self.breadcrumb(id, cx).await?.len() + 1)
    }

    /// Number of levels in the subtree rooted at `id`, soft-deleted nodes
    /// included. A leaf has height 1.
    pub async fn subtree_height(&self, id: Uuid, cx: &Cancellation) -> HierarchyResult<usize> {
        let subtree = self.collect_subtree(id, cx).await?;
        Ok(subtree.iter().map(|(_, depth)| *depth).max().unwrap_or(1))
    }

    /// Number of non-deleted transitive children, excluding the category itself
    pub async fn count_descendants(&self, id: Uuid, cx: &Cancellation) -> HierarchyResult<u64> {
        ensure_active(cx)?;
        self.live(id).await?;

        ensure_active(cx)?;
        let ceiling = self.repo.count(&CategoryFilter::everything()).await?;

        let mut visited = HashSet::from([id]);
        let mut frontier = vec![id];
        let mut descendants: u64 = 0;

        while let Some(current) = frontier.pop() {
            for child in self.children(Some(current), false, cx).await? {
                if !visited.insert(child.id) || visited.len() as u64 > ceiling {
                    tracing::warn!(category_id = %id, revisited = %child.id, "Cycle detected while counting descendants");
                    return Err(HierarchyError::CycleDetected(child.id));
                }
                descendants += 1;
                frontier.push(child.id);
            }
        }

        Ok(descendants)
    }

    /// Ids of `id` and everything below it in breadth-first order, each with
    /// its depth relative to `id` (1), soft-deleted nodes included. Parents
    /// always precede their children.
    async fn collect_subtree(
        &self,
        id: Uuid,
        cx: &Cancellation,
    ) -> HierarchyResult<Vec<(Uuid, usize)>> {
        let mut order = vec![(id, 1)];
        let mut visited = HashSet::from([id]);
        let mut queue = VecDeque::from([(id, 1usize)]);

        while let Some((current, depth)) = queue.pop_front() {
            let children = self.children(Some(current), true, cx).await?;
            if children.is_empty() {
                continue;
            }
            if depth >= self.config.max_depth {
                return Err(HierarchyError::CycleOrDepthExceeded {
                    id: current,
                    max_depth: self.config.max_depth,
                });
            }
            for child in children {
                if !visited.insert(child.id) {
                    tracing::warn!(category_id = %id, revisited = %child.id, "Cycle detected while collecting subtree");
                    return Err(HierarchyError::CycleDetected(child.id));
                }
                order.push((child.id, depth + 1));
                queue.push_back((child.id, depth + 1));
            }
        }

        Ok(order)
    }

    /// Remove a category together with all of its descendants.
    ///
    /// Soft removal flags the whole subtree in a single bulk update. Hard
    /// removal erases children before parents, one row at a time, and is a
    /// best-effort cascade, not atomic: if it stops after some rows are gone
    /// the error is [`HierarchyError::PartiallyApplied`] with the number of
    /// rows actually erased.
    ///
    /// Returns the number of categories affected (self + descendants).
    pub async fn remove_with_descendants(
        &self,
        id: Uuid,
        mode: RemovalMode,
        actor: Option<String>,
        cx: &Cancellation,
    ) -> HierarchyResult<u64> {
        ensure_active(cx)?;
        if self.repo.find_by_id(id).await?.is_none() {
            return Err(HierarchyError::NotFound(id));
        }

        let subtree = self.collect_subtree(id, cx).await?;

        match mode {
            RemovalMode::Soft => {
                ensure_active(cx)?;
                let ids = subtree.into_iter().map(|(node, _)| node).collect();
                let filter = CategoryFilter::by_ids(ids).including_deleted();
                let patch = CategoryPatch {
                    is_deleted: Some(true),
                    updated_by: actor,
                    ..CategoryPatch::default()
                };
                let result = self.repo.update_many(&filter, &patch).await?;
                tracing::info!(
                    category_id = %id,
                    matched = result.matched_count,
                    modified = result.modified_count,
                    "Category subtree soft-deleted"
                );
                Ok(result.matched_count)
            }
            RemovalMode::Hard => {
                let mut completed: u64 = 0;
                for (node, _) in subtree.iter().rev() {
                    if cx.is_cancelled() {
                        return Err(if completed == 0 {
                            HierarchyError::Cancelled
                        } else {
                            HierarchyError::PartiallyApplied { id, completed }
                        });
                    }
                    match self.repo.delete_by_id(*node).await {
                        Ok(true) => completed += 1,
                        // Already erased by someone else
                        Ok(false) => {}
                        Err(e) if completed == 0 => return Err(e.into()),
                        Err(e) => {
                            tracing::error!(
                                category_id = %id,
                                failed_at = %node,
                                completed,
                                "Cascading delete interrupted: {}",
                                e
                            );
                            return Err(HierarchyError::PartiallyApplied { id, completed });
                        }
                    }
                }
                tracing::info!(category_id = %id, removed = completed, "Category subtree deleted");
                Ok(completed)
            }
        }
    }

    /// Set `status` on every listed, non-deleted category.
    ///
    /// Flat on purpose: unlike removal this never cascades to children.
    /// `modified_count` only counts categories whose status actually changed.
    pub async fn bulk_update_status(
        &self,
        ids: &[Uuid],
        status: CategoryStatus,
        actor: Option<String>,
        cx: &Cancellation,
    ) -> HierarchyResult<UpdateResult> {
        let mut unique: Vec<Uuid> = Vec::with_capacity(ids.len());
        let mut seen = HashSet::with_capacity(ids.len());
        for id in ids {
            if seen.insert(*id) {
                unique.push(*id);
            }
        }

        if unique.is_empty() {
            return Err(HierarchyError::ValidationFailed(
                "At least one category id is required".to_string(),
            ));
        }

        ensure_active(cx)?;
        let patch = CategoryPatch {
            status: Some(status),
            updated_by: actor,
            ..CategoryPatch::default()
        };
        let result = self
            .repo
            .update_many(&CategoryFilter::by_ids(unique), &patch)
            .await?;

        tracing::info!(
            status = %status,
            matched = result.matched_count,
            modified = result.modified_count,
            "Bulk category status update"
        );

        Ok(result)
    }
}
