use anyhow::Result;
use shared::VideoStatus;

use super::{new_id, Comment, Database, Media, MediaUpdate, NewMedia, NewTestimonial, NewVideo};
use super::{Testimonial, TestimonialUpdate, Video, VideoUpdate};

const VIDEO_COLUMNS: &str = "id, title, description, location, vimeo_uri, thumbnail_url, \
    uploaded_by, uploader_type, status, views, created_at";

/// Tables whose row counts feed the admin dashboard
#[derive(Debug, Clone, Copy)]
pub enum CountedTable {
    Clients,
    Organizations,
    Volunteers,
    Videos,
    Comments,
}

impl CountedTable {
    fn name(&self) -> &'static str {
        match self {
            CountedTable::Clients => "clients",
            CountedTable::Organizations => "organizations",
            CountedTable::Volunteers => "volunteers",
            CountedTable::Videos => "videos",
            CountedTable::Comments => "comments",
        }
    }
}

impl Database {
    // Video operations
    pub async fn create_video(&self, video: &NewVideo) -> Result<Video> {
        let id = new_id();
        sqlx::query(
            r#"
            INSERT INTO videos (id, title, description, location, vimeo_uri, uploaded_by, uploader_type)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.location)
        .bind(&video.vimeo_uri)
        .bind(&video.uploaded_by)
        .bind(video.uploader_type.as_str())
        .execute(&self.pool)
        .await?;
        self.get_video(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("video {} vanished after insert", id))
    }

    pub async fn get_video(&self, id: &str) -> Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>(&format!(
            "SELECT {} FROM videos WHERE id = ?",
            VIDEO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(video)
    }

    pub async fn list_videos(&self) -> Result<Vec<Video>> {
        let videos = sqlx::query_as::<_, Video>(&format!(
            "SELECT {} FROM videos ORDER BY created_at DESC",
            VIDEO_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    pub async fn list_videos_by_status(&self, status: VideoStatus) -> Result<Vec<Video>> {
        let videos = sqlx::query_as::<_, Video>(&format!(
            "SELECT {} FROM videos WHERE status = ? ORDER BY created_at DESC",
            VIDEO_COLUMNS
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    pub async fn list_videos_by_uploader(&self, uploaded_by: &str) -> Result<Vec<Video>> {
        let videos = sqlx::query_as::<_, Video>(&format!(
            "SELECT {} FROM videos WHERE uploaded_by = ? ORDER BY created_at DESC",
            VIDEO_COLUMNS
        ))
        .bind(uploaded_by)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    pub async fn update_video(&self, id: &str, update: &VideoUpdate) -> Result<Option<Video>> {
        sqlx::query(
            r#"
            UPDATE videos SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                location = COALESCE(?, location),
                thumbnail_url = COALESCE(?, thumbnail_url)
            WHERE id = ?
            "#,
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.location)
        .bind(&update.thumbnail_url)
        .bind(id)
        .execute(&self.pool)
        .await?;
        self.get_video(id).await
    }

    pub async fn set_video_status(&self, id: &str, status: VideoStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE videos SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn increment_video_views(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE videos SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_video(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Comment operations
    pub async fn create_comment(
        &self,
        user_id: &str,
        user_name: &str,
        comment_text: &str,
        stars: i64,
    ) -> Result<Comment> {
        let id = new_id();
        sqlx::query(
            "INSERT INTO comments (id, user_name, comment_text, stars, user_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_name)
        .bind(comment_text)
        .bind(stars)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, user_name, comment_text, stars, user_id, created_at FROM comments WHERE id = ?",
        )
        .bind(&id)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    pub async fn list_comments(&self) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT id, user_name, comment_text, stars, user_id, created_at FROM comments ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    pub async fn delete_comment(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Media operations
    pub async fn create_media(&self, media: &NewMedia) -> Result<Media> {
        let id = new_id();
        sqlx::query("INSERT INTO media (id, title, description, photo_url) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(&media.title)
            .bind(&media.description)
            .bind(&media.photo_url)
            .execute(&self.pool)
            .await?;
        self.get_media(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("media {} vanished after insert", id))
    }

    pub async fn get_media(&self, id: &str) -> Result<Option<Media>> {
        let media = sqlx::query_as::<_, Media>(
            "SELECT id, title, description, photo_url, created_at FROM media WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(media)
    }

    pub async fn list_media(&self) -> Result<Vec<Media>> {
        let media = sqlx::query_as::<_, Media>(
            "SELECT id, title, description, photo_url, created_at FROM media ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(media)
    }

    pub async fn update_media(&self, id: &str, update: &MediaUpdate) -> Result<Option<Media>> {
        sqlx::query(
            r#"
            UPDATE media SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                photo_url = COALESCE(?, photo_url)
            WHERE id = ?
            "#,
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.photo_url)
        .bind(id)
        .execute(&self.pool)
        .await?;
        self.get_media(id).await
    }

    pub async fn delete_media(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM media WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Testimonial operations
    pub async fn create_testimonial(&self, testimonial: &NewTestimonial) -> Result<Testimonial> {
        let id = new_id();
        sqlx::query("INSERT INTO testimonials (id, name, text, photo_url) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(&testimonial.name)
            .bind(&testimonial.text)
            .bind(&testimonial.photo_url)
            .execute(&self.pool)
            .await?;
        self.get_testimonial(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("testimonial {} vanished after insert", id))
    }

    pub async fn get_testimonial(&self, id: &str) -> Result<Option<Testimonial>> {
        let testimonial = sqlx::query_as::<_, Testimonial>(
            "SELECT id, name, text, photo_url, created_at FROM testimonials WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(testimonial)
    }

    pub async fn list_testimonials(&self) -> Result<Vec<Testimonial>> {
        let testimonials = sqlx::query_as::<_, Testimonial>(
            "SELECT id, name, text, photo_url, created_at FROM testimonials ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(testimonials)
    }

    pub async fn update_testimonial(
        &self,
        id: &str,
        update: &TestimonialUpdate,
    ) -> Result<Option<Testimonial>> {
        sqlx::query(
            r#"
            UPDATE testimonials SET
                name = COALESCE(?, name),
                text = COALESCE(?, text),
                photo_url = COALESCE(?, photo_url)
            WHERE id = ?
            "#,
        )
        .bind(&update.name)
        .bind(&update.text)
        .bind(&update.photo_url)
        .bind(id)
        .execute(&self.pool)
        .await?;
        self.get_testimonial(id).await
    }

    pub async fn delete_testimonial(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM testimonials WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self, table: CountedTable) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table.name()))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewClient;
    use shared::UserType;

    fn new_video(title: &str, uploaded_by: &str) -> NewVideo {
        NewVideo {
            title: title.to_string(),
            description: None,
            location: Some("Veluwe".to_string()),
            vimeo_uri: Some("/videos/1".to_string()),
            uploaded_by: uploaded_by.to_string(),
            uploader_type: UserType::Volunteer,
        }
    }

    #[tokio::test]
    async fn test_video_moderation_and_views() {
        let db = Database::in_memory().await.unwrap();
        let video = db.create_video(&new_video("Heide in bloei", "vol-1")).await.unwrap();
        assert_eq!(video.status, "pending");
        assert_eq!(video.views, 0);

        assert!(db
            .list_videos_by_status(VideoStatus::Approved)
            .await
            .unwrap()
            .is_empty());

        assert!(db.set_video_status(&video.id, VideoStatus::Approved).await.unwrap());
        db.increment_video_views(&video.id).await.unwrap();
        db.increment_video_views(&video.id).await.unwrap();

        let approved = db.list_videos_by_status(VideoStatus::Approved).await.unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].views, 2);
        assert_eq!(approved[0].info().status, VideoStatus::Approved);
    }

    #[tokio::test]
    async fn test_videos_by_uploader() {
        let db = Database::in_memory().await.unwrap();
        db.create_video(&new_video("Duinen", "vol-1")).await.unwrap();
        db.create_video(&new_video("Bos", "vol-2")).await.unwrap();

        let own = db.list_videos_by_uploader("vol-1").await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].title, "Duinen");
    }

    #[tokio::test]
    async fn test_comment_requires_existing_client() {
        let db = Database::in_memory().await.unwrap();
        assert!(db.create_comment("missing", "Anna", "Mooi!", 5).await.is_err());

        let client = db
            .create_client(&NewClient {
                email: "anna@example.nl".to_string(),
                first_name: "Anna".to_string(),
                last_name: "Bakker".to_string(),
                subscription_status: "active".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let comment = db.create_comment(&client.id, "Anna", "Mooi!", 5).await.unwrap();
        assert_eq!(comment.stars, 5);
        assert_eq!(db.count(CountedTable::Comments).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stars_out_of_range_rejected() {
        let db = Database::in_memory().await.unwrap();
        let client = db
            .create_client(&NewClient {
                email: "b@example.nl".to_string(),
                first_name: "B".to_string(),
                last_name: "C".to_string(),
                subscription_status: "active".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(db.create_comment(&client.id, "B", "Te veel", 6).await.is_err());
    }

    #[tokio::test]
    async fn test_testimonial_update_keeps_unset_fields() {
        let db = Database::in_memory().await.unwrap();
        let testimonial = db
            .create_testimonial(&NewTestimonial {
                name: "Mevrouw Smit".to_string(),
                text: "Heerlijk om weer te wandelen".to_string(),
                photo_url: None,
            })
            .await
            .unwrap();

        let updated = db
            .update_testimonial(
                &testimonial.id,
                &TestimonialUpdate {
                    photo_url: Some("https://img/1.jpg".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.text, "Heerlijk om weer te wandelen");
        assert_eq!(updated.photo_url.as_deref(), Some("https://img/1.jpg"));
    }
}
