mod answer;
mod ids;
mod mode;
mod result;
mod session;
mod settings;
mod speech;
mod summary;
mod vocabulary;

pub use answer::{AnswerRecord, Evaluation, REVEALED_ANSWER_TEXT, UserAnswer, evaluate};
pub use ids::{ParseIdError, ResultId, WordListId};
pub use mode::{ParseQuizModeError, QuizMode};
pub use result::QuizResult;
pub use session::{Feedback, QuizAction, QuizError, QuizPhase, QuizSession, SessionProgress};
pub use settings::{MAX_CHOICES, MIN_CHOICES, QuizSettings, QuizSettingsDraft, QuizSettingsError};
pub use speech::{ParseSpeechPresetError, SpeechPreset, SpeechSettings, SpeechSettingsError, Voice};
pub use summary::{ScoreSummary, SummaryError, Tier};
pub use vocabulary::{
    VocabularyEntry, VocabularyError, VocabularyParseError, format_word_list, parse_word_list,
};
