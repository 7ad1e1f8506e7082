//! Courses command handler.

use clap::Args;
use syllabus_core::{config::AppConfig, AppResult};
use syllabus_knowledge::RagSystem;

/// List indexed courses
#[derive(Args, Debug)]
pub struct CoursesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CoursesCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let rag = RagSystem::open(config)?;
        let analytics = rag.course_analytics()?;

        if self.json {
            let output = serde_json::json!({
                "totalCourses": analytics.total_courses,
                "courseTitles": analytics.course_titles,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("{} courses indexed", analytics.total_courses);
        for title in &analytics.course_titles {
            println!("- {}", title);
        }

        Ok(())
    }
}
