//! A fixed set of prompts for judging a model, and the bookkeeping around
//! running them.

use std::time::{Duration, Instant};

use local_agent_ollama_model::OllamaProvider;

/// One prompt of the suite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PromptCase {
    /// Group the case is reported under.
    pub category: &'static str,
    /// Short description of what is being tested.
    pub description: &'static str,
    /// The text sent to the model.
    pub prompt: &'static str,
}

/// Category used for the quick tests.
pub const QUICK_TEST_CATEGORY: &str = "Quick Test";

/// Quick test run when none is named.
pub const DEFAULT_QUICK_TEST: &str = "hello_world";

/// The full suite, in the order it runs.
pub const PROMPT_SUITE: [PromptCase; 10] = [
    PromptCase {
        category: "Reasoning & Logic",
        description: "Multi-step reasoning problem",
        prompt: "A farmer has 17 sheep. All but 9 die. How many sheep does \
                 the farmer have left?\n\nThink through this step-by-step \
                 and explain your reasoning.",
    },
    PromptCase {
        category: "Coding",
        description: "Write a Python function",
        prompt: "Write a Python function that finds the longest palindromic \
                 substring in a given string. \nInclude docstring, type \
                 hints, and handle edge cases. Make it efficient.",
    },
    PromptCase {
        category: "Analysis",
        description: "Analyze data patterns",
        prompt: "Given this data:\n\
                 Sales Q1: $120K (up 15% from last year)\n\
                 Sales Q2: $95K (down 8% from last year)\n\
                 Sales Q3: $180K (up 42% from last year)\n\
                 Sales Q4: $150K (up 22% from last year)\n\n\
                 Analyze the trends, identify potential causes, and provide \
                 3 actionable recommendations.",
    },
    PromptCase {
        category: "Creativity",
        description: "Creative writing with constraints",
        prompt: "Write a 4-sentence story about AI that:\n\
                 1. Uses exactly 4 sentences\n\
                 2. Each sentence starts with a different letter: A, I, N, S\n\
                 3. Includes a plot twist\n\
                 4. Ends on a hopeful note",
    },
    PromptCase {
        category: "Technical Explanation",
        description: "ELI5 complex concept",
        prompt: "Explain how Docker containers work using only analogies \
                 that a 10-year-old would understand. \nNo technical jargon \
                 allowed.",
    },
    PromptCase {
        category: "Coding",
        description: "Code review and improvement",
        prompt: "Review this Python code and suggest improvements:\n\n\
                 def calc(x, y, op):\n\
                 \x20   if op == '+':\n\
                 \x20       return x + y\n\
                 \x20   elif op == '-':\n\
                 \x20       return x - y\n\
                 \x20   elif op == '*':\n\
                 \x20       return x * y\n\
                 \x20   elif op == '/':\n\
                 \x20       return x / y\n\n\
                 List: 1) bugs, 2) style issues, 3) improved version",
    },
    PromptCase {
        category: "Problem Solving",
        description: "Algorithm design",
        prompt: "Design an algorithm to detect if a meeting room is \
                 available given:\n\
                 - A list of booked time slots: [(9,10), (11,13), (14,15)]\n\
                 - New meeting request: (13, 14)\n\n\
                 Explain your approach and provide pseudocode.",
    },
    PromptCase {
        category: "Instruction Following",
        description: "Follow specific format",
        prompt: "List 5 benefits of containerization in this EXACT format:\n\
                 BENEFIT: [name]\n\
                 WHY: [one sentence explanation]\n\
                 EXAMPLE: [specific use case]\n\n\
                 (Repeat 5 times, numbered)",
    },
    PromptCase {
        category: "Critical Thinking",
        description: "Identify edge cases",
        prompt: "I'm building a function to calculate age from birthdate. \n\
                 List 7 edge cases I should handle, ordered from most to \
                 least critical.",
    },
    PromptCase {
        category: "Practical Application",
        description: "Zscaler certificate troubleshooting",
        prompt: "A Docker container can't pull images due to Zscaler proxy. \n\
                 The error is: \"x509: certificate signed by unknown \
                 authority\"\n\n\
                 Provide:\n\
                 1. Root cause (1 sentence)\n\
                 2. Quick fix (3 steps)\n\
                 3. Proper solution (with example code)",
    },
];

/// Short single prompts for a fast smoke test, by name.
pub const QUICK_TESTS: [(&str, PromptCase); 5] = [
    (
        "hello_world",
        quick(
            "Basic response test",
            "Say 'Hello, World!' and explain what Docker containers are in \
             exactly 2 sentences.",
        ),
    ),
    (
        "reasoning",
        quick(
            "Quick reasoning check",
            "If it takes 5 machines 5 minutes to make 5 widgets, how long \
             would it take 100 machines to make 100 widgets?",
        ),
    ),
    (
        "code",
        quick(
            "Simple coding test",
            "Write a Python one-liner to reverse a string.",
        ),
    ),
    (
        "math",
        quick(
            "Basic math operations",
            "Calculate: (15 * 8) + (120 / 4) - 17. Show your work.",
        ),
    ),
    (
        "instruction",
        quick(
            "Instruction following",
            "List exactly 3 Docker commands. Format: COMMAND - DESCRIPTION. \
             No extra text.",
        ),
    ),
];

const fn quick(description: &'static str, prompt: &'static str) -> PromptCase {
    PromptCase {
        category: QUICK_TEST_CATEGORY,
        description,
        prompt,
    }
}

/// Looks up a quick test by name.
pub fn quick_test(name: &str) -> Option<PromptCase> {
    QUICK_TESTS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, case)| *case)
}

/// The outcome of one case.
#[derive(Clone, Debug, PartialEq)]
pub struct SuiteResult {
    /// Category of the case.
    pub category: String,
    /// Description of the case.
    pub description: String,
    /// The full answer, or the error message.
    pub response: Result<String, String>,
    /// Wall time from sending the prompt to the end of the answer.
    pub elapsed: Duration,
}

impl SuiteResult {
    /// Returns `true` if the model answered.
    #[inline]
    pub fn success(&self) -> bool {
        self.response.is_ok()
    }
}

/// Sends `case` to the model, streaming the answer to `on_delta`.
pub async fn run_case(
    provider: &OllamaProvider,
    case: &PromptCase,
    on_delta: impl FnMut(&str),
) -> SuiteResult {
    let started = Instant::now();
    let response = provider
        .generate(case.prompt, on_delta)
        .await
        .map_err(|err| {
            warn!("{} / {} failed: {err}", case.category, case.description);
            err.to_string()
        });
    SuiteResult {
        category: case.category.to_owned(),
        description: case.description.to_owned(),
        response,
        elapsed: started.elapsed(),
    }
}

/// Per-category totals of a [`SuiteSummary`].
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryStats {
    /// The category.
    pub category: String,
    /// Number of cases that got an answer.
    pub successes: usize,
    /// Number of cases run.
    pub total: usize,
    /// Summed wall time.
    pub total_time: Duration,
}

impl CategoryStats {
    /// Share of successful cases, in percent.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.successes as f64 / self.total as f64 * 100.0
    }

    /// Mean wall time per case.
    pub fn average_time(&self) -> Duration {
        average(self.total_time, self.total)
    }

    /// Returns `true` if every case of the category succeeded.
    #[inline]
    pub fn all_passed(&self) -> bool {
        self.successes == self.total
    }
}

/// Aggregated results of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SuiteSummary {
    /// Number of cases run.
    pub total: usize,
    /// Number of cases that got an answer.
    pub successes: usize,
    /// Summed wall time.
    pub total_time: Duration,
    /// Totals per category, in order of first appearance.
    pub categories: Vec<CategoryStats>,
}

impl SuiteSummary {
    /// Aggregates `results`.
    pub fn from_results(results: &[SuiteResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.total += 1;
            summary.total_time += result.elapsed;

            let index = match summary
                .categories
                .iter()
                .position(|stats| stats.category == result.category)
            {
                Some(index) => index,
                None => {
                    summary.categories.push(CategoryStats {
                        category: result.category.clone(),
                        successes: 0,
                        total: 0,
                        total_time: Duration::ZERO,
                    });
                    summary.categories.len() - 1
                }
            };
            let stats = &mut summary.categories[index];
            stats.total += 1;
            stats.total_time += result.elapsed;

            if result.success() {
                summary.successes += 1;
                stats.successes += 1;
            }
        }
        summary
    }

    /// Number of failed cases.
    #[inline]
    pub fn failures(&self) -> usize {
        self.total - self.successes
    }

    /// Mean wall time per case, zero for an empty run.
    #[inline]
    pub fn average_time(&self) -> Duration {
        average(self.total_time, self.total)
    }
}

fn average(total: Duration, count: usize) -> Duration {
    match u32::try_from(count) {
        Ok(0) | Err(_) => Duration::ZERO,
        Ok(count) => total / count,
    }
}

#[cfg(test)]
mod tests {
    use local_agent_ollama_model::OllamaConfigBuilder;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn result(category: &str, ok: bool, secs: u64) -> SuiteResult {
        SuiteResult {
            category: category.to_owned(),
            description: String::new(),
            response: if ok {
                Ok("answer".to_owned())
            } else {
                Err("HTTP 500".to_owned())
            },
            elapsed: Duration::from_secs(secs),
        }
    }

    #[test]
    fn test_quick_tests() {
        let case = quick_test(DEFAULT_QUICK_TEST).unwrap();
        assert_eq!(case.category, QUICK_TEST_CATEGORY);
        assert_eq!(case.description, "Basic response test");
        assert!(quick_test("math").unwrap().prompt.starts_with("Calculate:"));
        assert_eq!(quick_test("poetry"), None);
    }

    #[test]
    fn test_suite_prompts() {
        assert_eq!(PROMPT_SUITE[0].category, "Reasoning & Logic");
        assert!(PROMPT_SUITE[5].prompt.contains("\n    if op == '+':\n"));
        assert_eq!(
            PROMPT_SUITE
                .iter()
                .filter(|case| case.category == "Coding")
                .count(),
            2
        );
    }

    #[test]
    fn test_summary() {
        let summary = SuiteSummary::from_results(&[
            result("Coding", true, 4),
            result("Analysis", false, 1),
            result("Coding", false, 2),
            result("Analysis", false, 3),
        ]);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.successes, 1);
        assert_eq!(summary.failures(), 3);
        assert_eq!(summary.total_time, Duration::from_secs(10));
        assert_eq!(summary.average_time(), Duration::from_millis(2500));

        let coding = &summary.categories[0];
        assert_eq!(coding.category, "Coding");
        assert_eq!(coding.success_rate(), 50.0);
        assert_eq!(coding.average_time(), Duration::from_secs(3));
        assert!(!coding.all_passed());
        assert_eq!(summary.categories[1].success_rate(), 0.0);

        let empty = SuiteSummary::from_results(&[]);
        assert_eq!(empty.average_time(), Duration::ZERO);
        assert!(empty.categories.is_empty());
    }

    #[tokio::test]
    async fn test_run_case() {
        let server = MockServer::start().await;
        let body = [
            json!({ "response": "Hello, ", "done": false }),
            json!({ "response": "World!", "done": false }),
            json!({ "response": "", "done": true }),
        ]
        .iter()
        .map(|line| format!("{line}\n"))
        .collect::<String>();
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({ "model": "llama3.2" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body, "application/x-ndjson"),
            )
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(
            OllamaConfigBuilder::new().with_host(server.uri()).build(),
        );
        let case = quick_test("hello_world").unwrap();
        let mut streamed = Vec::new();
        let result =
            run_case(&provider, &case, |delta| streamed.push(delta.to_owned()))
                .await;

        assert!(result.success());
        assert_eq!(result.response.as_deref(), Ok("Hello, World!"));
        assert_eq!(streamed, ["Hello, ", "World!"]);
        assert_eq!(result.category, QUICK_TEST_CATEGORY);
    }

    #[tokio::test]
    async fn test_run_case_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({ "error": "model crashed" })),
            )
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(
            OllamaConfigBuilder::new().with_host(server.uri()).build(),
        );
        let result = run_case(&provider, &PROMPT_SUITE[0], |_| {}).await;

        assert!(!result.success());
        let err = result.response.as_ref().unwrap_err();
        assert!(err.contains("500"));
        assert!(err.contains("model crashed"));

        let summary = SuiteSummary::from_results(&[result]);
        assert_eq!(summary.failures(), 1);
    }
}
