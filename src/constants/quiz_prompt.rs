/// Substituted when a generated question arrives without an explanation.
pub const EXPLANATION_PLACEHOLDER: &str = "No explanation was provided for this question.";

/// Placeholders: {topic}, {count}, {difficulty}, {language}, {contract}.
pub const TOPIC_QUIZ_PROMPT: &str = "You are an experienced educator writing a multiple-choice quiz.

Write a quiz about the topic: \"{topic}\".
- Number of questions: {count}.
- Difficulty: {difficulty}.
- Language of every question, option and explanation: {language}.

Each question must have exactly four distinct options and exactly one correct option.
Vary the position of the correct option between questions.

{contract}";

/// Placeholders: {chunk}, {language}, {contract}.
pub const CHUNK_QUIZ_PROMPT: &str = "You are an experienced educator turning study material into a multiple-choice quiz.

Read the source text between the <source> tags and write as many questions as the text supports,
covering its key facts, definitions and relationships. Do not ask about anything the text does not state.
- Language of every question, option and explanation: {language}.
- Each question must have four distinct options and exactly one correct option.

<source>
{chunk}
</source>

{contract}";

/// Placeholder: {schema}.
pub const OUTPUT_CONTRACT: &str = "OUTPUT FORMAT: respond with ONLY a JSON array (no prose, no markdown fences). Each element is an object:
[
    {
        \"question\": \"The question text?\",
        \"options\": [\"Option A\", \"Option B\", \"Option C\", \"Option D\"],
        \"correct_answer\": \"Copied verbatim from options\",
        \"explanation\": \"Why this answer is correct and the others are not.\"
    }
]
The fields question, options and correct_answer are required. Every element must match this JSON Schema:
{schema}";
