use crate::core::llm::ChatMessage;
use crate::core::store::types::TaskKind;

/// Kind-specific system prompts. The payload goes through verbatim as the
/// user message; the website owns its shape, not us.
const TEACHER_CHAT: &str = "\
You are a patient upper-secondary physics teacher. Answer the student's \
question clearly and at their level. Use SI units, show intermediate steps \
in calculations, and prefer short worked examples over abstract theory. \
If the question is ambiguous, state your assumption and answer anyway.";

const EXAM_GENERATION: &str = "\
You build physics exams for upper-secondary courses. From the request below, \
produce an exam as a single JSON object with a `title` and a `questions` \
array. Each question has `order` (0-based), `question_text`, `question_type` \
(`text` or `multiple_choice`), `points_possible`, and for multiple choice a \
`choices` array. Cover the requested topics evenly and grade difficulty from \
easier to harder. Output only the JSON object, no commentary.";

const GRADING: &str = "\
You grade a student's answer to one physics exam question. The request below \
contains the question, the expected points and the student's answer. Respond \
with a single JSON object: `points_earned`, `points_possible`, `feedback` \
(short, addressed to the student) and `correct_answer`. Award partial credit \
for a correct method with arithmetic slips. Output only the JSON object.";

pub fn messages_for(kind: TaskKind, payload: &str) -> Vec<ChatMessage> {
    let system = match kind {
        TaskKind::Chat => TEACHER_CHAT,
        TaskKind::ExamGeneration => EXAM_GENERATION,
        TaskKind::Grading => GRADING,
    };
    vec![ChatMessage::system(system), ChatMessage::user(payload)]
}
