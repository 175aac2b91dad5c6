use super::{optional, required};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    new_id, timestamp, Checklist, ChecklistAnswer, CompleteChecklist, CompletedChecklist, CreateChecklist, YesNo,
};
use crate::store::{Direction, Document};

pub fn get_checklists(db: &Database, site: &str) -> Result<Vec<Checklist>> {
    db.query(&Checklist::query().eq("site", site).order_by("created_at", Direction::Desc))
}

pub fn create_checklist(db: &Database, checklist: CreateChecklist) -> Result<Checklist> {
    let title = required(&checklist.title, "Title")?;
    let created_by = required(&checklist.created_by, "Author")?;

    let questions: Vec<String> = checklist
        .questions
        .iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();
    if questions.is_empty() {
        return Err(Error::validation("A checklist needs at least one question"));
    }

    let checklist = Checklist {
        id: new_id(),
        site: required(&checklist.site, "Site")?,
        title,
        questions,
        created_at: timestamp(),
        created_by,
        last_completed_at: None,
        last_completed_by: None,
    };
    db.insert(&checklist)?;
    tracing::info!(checklist_id = %checklist.id, "Created checklist {}", checklist.title);

    Ok(checklist)
}

pub fn delete_checklist(db: &Database, id: &str) -> Result<()> {
    db.delete::<Checklist>(id)?;
    tracing::info!(checklist_id = id, "Deleted checklist");
    Ok(())
}

/// Answers in template order. Every question needs an answer and every
/// "No" needs a corrective action.
fn collect_answers(checklist: &Checklist, answers: &[ChecklistAnswer]) -> Result<Vec<ChecklistAnswer>> {
    checklist
        .questions
        .iter()
        .map(|question| {
            let answer = answers
                .iter()
                .find(|a| a.question.trim() == question)
                .ok_or_else(|| Error::validation(format!("Unanswered question: {question}")))?;

            let corrective_action = match answer.answer {
                YesNo::Yes => None,
                YesNo::No => Some(optional(answer.corrective_action.clone()).ok_or_else(|| {
                    Error::validation(format!("Corrective action required for: {question}"))
                })?),
            };

            Ok(ChecklistAnswer {
                question: question.clone(),
                answer: answer.answer,
                corrective_action,
            })
        })
        .collect()
}

/// Marks the template as completed, then stores the completion record. The
/// two writes are not atomic: if the second fails the template keeps its new
/// last-completed fields.
pub fn complete_checklist(db: &Database, completion: CompleteChecklist) -> Result<CompletedChecklist> {
    let mut checklist: Checklist = db.get(&completion.checklist_id)?;
    let completed_by = required(&completion.completed_by, "Name")?;
    let answers = collect_answers(&checklist, &completion.answers)?;
    let completed_at = timestamp();

    checklist.last_completed_at = Some(completed_at);
    checklist.last_completed_by = Some(completed_by.clone());
    db.set(&checklist)?;

    let record = CompletedChecklist {
        id: new_id(),
        checklist_id: checklist.id.clone(),
        title: checklist.title.clone(),
        site: checklist.site.clone(),
        answers,
        completed_by,
        completed_at,
    };
    db.insert(&record).map_err(|e| {
        tracing::error!(checklist_id = %checklist.id, "Checklist marked complete but record not saved: {e}");
        e
    })?;
    tracing::info!(checklist_id = %checklist.id, record_id = %record.id, "Completed checklist");

    Ok(record)
}

pub fn get_completed_checklists(db: &Database, site: &str) -> Result<Vec<CompletedChecklist>> {
    db.query(&CompletedChecklist::query().eq("site", site).order_by("completed_at", Direction::Desc))
}
