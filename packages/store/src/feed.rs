//! Review views derived from the mirrored review list.

use std::cmp::Reverse;

use crate::models::Review;

/// For each user in `following` (in that order), their single most recent
/// review. Users without reviews are skipped.
pub fn latest_per_user(following: &[String], reviews: &[Review]) -> Vec<Review> {
    following
        .iter()
        .filter_map(|user| {
            reviews
                .iter()
                .filter(|review| &review.user == user)
                .max_by_key(|review| review.timestamp)
                .cloned()
        })
        .collect()
}

/// Reviews of one dish at one restaurant, newest first.
pub fn reviews_for_dish(reviews: &[Review], restaurant: &str, dish: &str) -> Vec<Review> {
    newest_first(
        reviews
            .iter()
            .filter(|review| review.restaurant == restaurant && review.dish == dish),
    )
}

/// Reviews written by `user`, newest first.
pub fn reviews_by(reviews: &[Review], user: &str) -> Vec<Review> {
    newest_first(reviews.iter().filter(|review| review.user == user))
}

fn newest_first<'a>(reviews: impl Iterator<Item = &'a Review>) -> Vec<Review> {
    let mut reviews: Vec<Review> = reviews.cloned().collect();
    reviews.sort_by_key(|review| Reverse(review.timestamp));
    reviews
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(user: &str, dish: &str, ts: i64) -> Review {
        Review::new(user, "Trattoria", dish, 4, "", "").at(ts)
    }

    #[test]
    fn test_latest_review_per_followed_user() {
        let reviews = vec![
            review("a@x.com", "Carbonara", 1),
            review("a@x.com", "Tiramisu", 5),
            review("b@x.com", "Carbonara", 3),
            review("c@x.com", "Carbonara", 9),
        ];
        let following = vec!["a@x.com".to_string(), "b@x.com".to_string()];

        let latest = latest_per_user(&following, &reviews);
        assert_eq!(latest, vec![reviews[1].clone(), reviews[2].clone()]);
    }

    #[test]
    fn test_followed_users_without_reviews_are_skipped() {
        let reviews = vec![review("b@x.com", "Carbonara", 3)];
        let following = vec!["nobody@x.com".to_string(), "b@x.com".to_string()];

        let latest = latest_per_user(&following, &reviews);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].user, "b@x.com");
        assert!(latest_per_user(&[], &reviews).is_empty());
    }

    #[test]
    fn test_dish_and_user_views_sort_newest_first() {
        let reviews = vec![
            review("a@x.com", "Carbonara", 1),
            review("b@x.com", "Carbonara", 7),
            review("a@x.com", "Tiramisu", 4),
            review("a@x.com", "Carbonara", 3),
        ];

        let timestamps: Vec<_> = reviews_for_dish(&reviews, "Trattoria", "Carbonara")
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(timestamps, [7, 3, 1]);
        assert!(reviews_for_dish(&reviews, "Elsewhere", "Carbonara").is_empty());

        let timestamps: Vec<_> = reviews_by(&reviews, "a@x.com")
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(timestamps, [4, 3, 1]);
    }
}
