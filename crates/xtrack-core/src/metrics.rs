//! Campaign-level engagement aggregates over stored posts.

use serde::Serialize;

/// Interaction counts needed to aggregate a post.
pub trait EngagementCounts {
    fn likes(&self) -> i64;
    fn retweets(&self) -> i64;
    fn replies(&self) -> i64;
    fn views(&self) -> i64;

    /// Ranking score for the top post. Retweets weigh double.
    fn top_post_score(&self) -> i64 {
        self.likes()
            .saturating_add(self.retweets().saturating_mul(2))
            .saturating_add(self.replies())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignMetrics<P> {
    pub total_posts: usize,
    pub total_likes: i64,
    pub total_retweets: i64,
    pub total_replies: i64,
    pub total_views: i64,
    /// `(likes + retweets + replies) / views * 100`, two decimals; `0.0` without views.
    pub engagement_rate: f64,
    pub top_post: Option<P>,
}

/// Aggregate totals, engagement rate, and the top post.
///
/// Ties for the top post go to the earliest entry in `posts`.
#[must_use]
pub fn compute_metrics<P>(posts: &[P]) -> CampaignMetrics<P>
where
    P: EngagementCounts + Clone,
{
    let mut total_likes: i64 = 0;
    let mut total_retweets: i64 = 0;
    let mut total_replies: i64 = 0;
    let mut total_views: i64 = 0;
    let mut top: Option<(&P, i64)> = None;

    for post in posts {
        total_likes = total_likes.saturating_add(post.likes());
        total_retweets = total_retweets.saturating_add(post.retweets());
        total_replies = total_replies.saturating_add(post.replies());
        total_views = total_views.saturating_add(post.views());

        let score = post.top_post_score();
        match top {
            Some((_, best)) if score <= best => {}
            _ => top = Some((post, score)),
        }
    }

    let interactions = total_likes
        .saturating_add(total_retweets)
        .saturating_add(total_replies);

    CampaignMetrics {
        total_posts: posts.len(),
        total_likes,
        total_retweets,
        total_replies,
        total_views,
        engagement_rate: engagement_rate(interactions, total_views),
        top_post: top.map(|(post, _)| post.clone()),
    }
}

#[allow(clippy::cast_precision_loss)]
fn engagement_rate(interactions: i64, views: i64) -> f64 {
    if views <= 0 {
        return 0.0;
    }
    let rate = interactions as f64 / views as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Counts {
        id: &'static str,
        likes: i64,
        retweets: i64,
        replies: i64,
        views: i64,
    }

    impl EngagementCounts for Counts {
        fn likes(&self) -> i64 {
            self.likes
        }
        fn retweets(&self) -> i64 {
            self.retweets
        }
        fn replies(&self) -> i64 {
            self.replies
        }
        fn views(&self) -> i64 {
            self.views
        }
    }

    fn counts(id: &'static str, likes: i64, retweets: i64, replies: i64, views: i64) -> Counts {
        Counts {
            id,
            likes,
            retweets,
            replies,
            views,
        }
    }

    #[test]
    fn empty_input_yields_zeroes() {
        let metrics = compute_metrics::<Counts>(&[]);
        assert_eq!(metrics.total_posts, 0);
        assert_eq!(metrics.total_likes, 0);
        assert_eq!(metrics.total_retweets, 0);
        assert_eq!(metrics.total_replies, 0);
        assert_eq!(metrics.total_views, 0);
        assert!(metrics.engagement_rate.abs() < f64::EPSILON);
        assert!(metrics.top_post.is_none());
    }

    #[test]
    fn totals_are_exact_sums() {
        let posts = vec![counts("a", 10, 2, 1, 1000), counts("b", 5, 3, 4, 500)];
        let metrics = compute_metrics(&posts);
        assert_eq!(metrics.total_posts, 2);
        assert_eq!(metrics.total_likes, 15);
        assert_eq!(metrics.total_retweets, 5);
        assert_eq!(metrics.total_replies, 5);
        assert_eq!(metrics.total_views, 1500);
    }

    #[test]
    fn engagement_rate_rounds_to_two_decimals() {
        // 25 / 1500 * 100 = 1.6666...
        let posts = vec![counts("a", 10, 2, 1, 1000), counts("b", 5, 3, 4, 500)];
        let metrics = compute_metrics(&posts);
        assert!((metrics.engagement_rate - 1.67).abs() < 1e-9);
    }

    #[test]
    fn engagement_rate_is_zero_without_views() {
        let posts = vec![counts("a", 100, 50, 20, 0)];
        let metrics = compute_metrics(&posts);
        assert!(metrics.engagement_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn top_post_weights_retweets_double() {
        // a: 10 + 0 + 0 = 10; b: 2 + 2*5 + 0 = 12
        let posts = vec![counts("a", 10, 0, 0, 0), counts("b", 2, 5, 0, 0)];
        let metrics = compute_metrics(&posts);
        assert_eq!(metrics.top_post.map(|p| p.id), Some("b"));
    }

    #[test]
    fn top_post_tie_goes_to_first() {
        let posts = vec![
            counts("first", 4, 1, 0, 0),
            counts("second", 2, 2, 0, 0),
            counts("third", 6, 0, 0, 0),
        ];
        let metrics = compute_metrics(&posts);
        assert_eq!(metrics.top_post.map(|p| p.id), Some("first"));
    }
}
