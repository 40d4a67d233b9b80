use gtrack_core::models::GenomicInterval;

/// Expansion multiplier, in tenths: the fetch is at most 4.1x the view width.
const EXPANSION_TENTHS: u64 = 41;

///
/// Decides the interval actually fetched for a requested view.
///
/// When the visibility window is wider than the view, the fetch is widened so
/// that nearby scrolling and zooming can be served from the same cache. The
/// widening is bounded by both the visibility window and a fixed multiple of
/// the view width.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlanner {
    expand: bool,
    min_query_size: Option<u64>,
}

impl Default for QueryPlanner {
    fn default() -> Self {
        QueryPlanner::new(true)
    }
}

impl QueryPlanner {
    pub fn new(expand_allowed: bool) -> Self {
        QueryPlanner {
            expand: expand_allowed,
            min_query_size: None,
        }
    }

    /// Never widen to less than `size` bases when widening applies.
    pub fn with_min_query_size(mut self, size: Option<u64>) -> Self {
        self.min_query_size = size;
        self
    }

    ///
    /// Width of the widened fetch for a view of `width` bases:
    /// `min(4.1 * width, visibility_window)`, raised to the minimum query size
    /// if one is set.
    ///
    pub fn expansion_window(&self, width: u64, visibility_window: u64) -> u64 {
        let window = (width.saturating_mul(EXPANSION_TENTHS) / 10).min(visibility_window);
        match self.min_query_size {
            Some(min) => window.max(min),
            None => window,
        }
    }

    ///
    /// Fetch interval for `requested` under `visibility_window`, in order:
    ///
    /// 1. expansion disabled: the requested interval
    /// 2. no window, or window <= 0: the whole chromosome
    /// 3. window wider than the view: `[max(0, mid - w/2), start + w)` where
    ///    `w` is the [expansion window](Self::expansion_window)
    /// 4. otherwise: the requested interval
    ///
    pub fn plan(&self, requested: &GenomicInterval, visibility_window: Option<i64>) -> GenomicInterval {
        self.plan_with_length(requested, visibility_window, None)
    }

    ///
    /// Like [`plan`](Self::plan), but a known chromosome length bounds the
    /// whole-chromosome case to `[0, max(length, requested.end))` instead of
    /// the open-ended sentinel.
    ///
    pub fn plan_with_length(
        &self,
        requested: &GenomicInterval,
        visibility_window: Option<i64>,
        chromosome_length: Option<u64>,
    ) -> GenomicInterval {
        if !self.expand {
            return requested.clone();
        }

        let window = match visibility_window {
            Some(w) if w > 0 => w as u64,
            _ => {
                let end = match chromosome_length {
                    Some(len) => len.max(requested.end),
                    None => GenomicInterval::TO_END,
                };
                return GenomicInterval::new(requested.chr.clone(), 0, end);
            }
        };

        let width = requested.width();
        if window > width {
            let expansion = self.expansion_window(width, window);
            let start = requested.mid_point().saturating_sub(expansion / 2);
            let end = requested.start.saturating_add(expansion);
            return GenomicInterval::new(requested.chr.clone(), start, end);
        }

        requested.clone()
    }
}
