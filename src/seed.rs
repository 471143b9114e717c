use chrono::{Duration, Utc};

use crate::db::operations::assignment::{self, NewAssignment};
use crate::db::operations::course::{self, NewCourse};
use crate::db::operations::quiz::{self, NewQuiz, QuizQuestion};
use crate::db::DatabaseProxy;
use crate::services::assessment;
use crate::services::ServiceError;

const CATALOG: &[NewCourse<'static>] = &[
    NewCourse {
        id: "webdev",
        title: "Web Development",
        description: "Learn HTML, CSS, JavaScript, and modern web development practices",
        duration: "12 weeks",
        icon: "🌐",
        difficulty_level: "Beginner",
        category: "Programming",
        prerequisites: Some("Basic computer skills"),
        learning_outcomes: &[
            "Build responsive websites",
            "Master JavaScript fundamentals",
            "Work with modern CSS frameworks",
            "Deploy web applications",
        ],
    },
    NewCourse {
        id: "reactjs",
        title: "ReactJS",
        description: "Master React.js including hooks, context, and state management",
        duration: "8 weeks",
        icon: "⚛️",
        difficulty_level: "Intermediate",
        category: "Frontend",
        prerequisites: Some("JavaScript fundamentals"),
        learning_outcomes: &[
            "Build interactive UIs with React",
            "Manage application state",
            "Implement React Router",
            "Deploy React applications",
        ],
    },
    NewCourse {
        id: "expressjs",
        title: "ExpressJS",
        description: "Build robust backend services with Express.js and Node.js",
        duration: "6 weeks",
        icon: "🚀",
        difficulty_level: "Intermediate",
        category: "Backend",
        prerequisites: Some("JavaScript fundamentals"),
        learning_outcomes: &[
            "Create RESTful APIs",
            "Handle authentication and authorization",
            "Work with databases",
            "Deploy Node.js applications",
        ],
    },
    NewCourse {
        id: "django",
        title: "Django",
        description: "Create powerful web applications with Python and Django",
        duration: "10 weeks",
        icon: "🐍",
        difficulty_level: "Intermediate",
        category: "Backend",
        prerequisites: Some("Python fundamentals"),
        learning_outcomes: &[
            "Build web applications with Django",
            "Work with Django ORM",
            "Implement authentication systems",
            "Deploy Django applications",
        ],
    },
    NewCourse {
        id: "java",
        title: "Java",
        description: "Learn core Java programming and enterprise development",
        duration: "14 weeks",
        icon: "☕",
        difficulty_level: "Intermediate",
        category: "Programming",
        prerequisites: Some("Basic programming knowledge"),
        learning_outcomes: &[
            "Master Java syntax and OOP",
            "Work with Java collections",
            "Build desktop applications",
            "Understand Java enterprise concepts",
        ],
    },
    NewCourse {
        id: "python",
        title: "Python",
        description: "Master Python programming from basics to advanced concepts",
        duration: "10 weeks",
        icon: "🐍",
        difficulty_level: "Beginner",
        category: "Programming",
        prerequisites: None,
        learning_outcomes: &[
            "Master Python syntax",
            "Work with data structures",
            "Build automation scripts",
            "Understand object-oriented programming",
        ],
    },
    NewCourse {
        id: "aws",
        title: "AWS",
        description: "Cloud computing and deployment with Amazon Web Services",
        duration: "8 weeks",
        icon: "☁️",
        difficulty_level: "Advanced",
        category: "Cloud",
        prerequisites: Some("Basic computer skills"),
        learning_outcomes: &[
            "Understand cloud computing concepts",
            "Work with AWS services",
            "Deploy applications to AWS",
            "Manage cloud infrastructure",
        ],
    },
    NewCourse {
        id: "ai",
        title: "AI",
        description: "Artificial Intelligence fundamentals and applications",
        duration: "12 weeks",
        icon: "🤖",
        difficulty_level: "Advanced",
        category: "AI/ML",
        prerequisites: Some("Python programming, Mathematics"),
        learning_outcomes: &[
            "Understand AI concepts",
            "Work with machine learning algorithms",
            "Build AI models",
            "Deploy AI applications",
        ],
    },
    NewCourse {
        id: "genai",
        title: "Generative AI",
        description: "Learn about LLMs, diffusion models, and AI content generation",
        duration: "8 weeks",
        icon: "🎨",
        difficulty_level: "Advanced",
        category: "AI/ML",
        prerequisites: Some("Python programming, AI basics"),
        learning_outcomes: &[
            "Understand generative AI concepts",
            "Work with large language models",
            "Build AI content generators",
            "Deploy generative AI applications",
        ],
    },
    NewCourse {
        id: "devops",
        title: "DevOps",
        description: "Master CI/CD, containerization, and deployment automation",
        duration: "10 weeks",
        icon: "⚙️",
        difficulty_level: "Advanced",
        category: "DevOps",
        prerequisites: Some("Basic programming knowledge"),
        learning_outcomes: &[
            "Understand DevOps practices",
            "Work with CI/CD pipelines",
            "Containerize applications",
            "Automate deployment processes",
        ],
    },
];

struct SampleAssignment {
    course_id: &'static str,
    title: &'static str,
    description: &'static str,
    instructions: &'static str,
    due_in_days: i64,
}

const SAMPLE_ASSIGNMENTS: &[SampleAssignment] = &[
    SampleAssignment {
        course_id: "webdev",
        title: "Build a Personal Portfolio",
        description: "Create a responsive personal portfolio website using HTML, CSS, and JavaScript",
        instructions: "Create a portfolio with sections for About, Projects, Skills, and Contact. Use modern CSS techniques and make it mobile-responsive.",
        due_in_days: 14,
    },
    SampleAssignment {
        course_id: "reactjs",
        title: "Todo App with React",
        description: "Build a todo application using React hooks and state management",
        instructions: "Create a todo app with features like adding, editing, deleting todos, and filtering by status.",
        due_in_days: 10,
    },
    SampleAssignment {
        course_id: "python",
        title: "Data Analysis Project",
        description: "Analyze a dataset using Python and pandas",
        instructions: "Choose a dataset and perform analysis including data cleaning, visualization, and insights.",
        due_in_days: 21,
    },
];

struct SampleQuiz {
    course_id: &'static str,
    title: &'static str,
    description: &'static str,
    /// (question, options, correct answer)
    questions: &'static [(&'static str, &'static [&'static str], &'static str)],
    time_limit: i64,
    passing_score: i64,
}

const SAMPLE_QUIZZES: &[SampleQuiz] = &[
    SampleQuiz {
        course_id: "webdev",
        title: "HTML & CSS Fundamentals",
        description: "Test your knowledge of HTML and CSS basics",
        questions: &[
            (
                "What does HTML stand for?",
                &[
                    "HyperText Markup Language",
                    "High Tech Modern Language",
                    "Home Tool Markup Language",
                    "Hyperlink and Text Markup Language",
                ],
                "HyperText Markup Language",
            ),
            (
                "Which CSS property is used to change the background color?",
                &["color", "background-color", "bg-color", "background"],
                "background-color",
            ),
            (
                "What is the correct HTML element for the largest heading?",
                &["<heading>", "<h1>", "<h6>", "<head>"],
                "<h1>",
            ),
        ],
        time_limit: 20,
        passing_score: 70,
    },
    SampleQuiz {
        course_id: "reactjs",
        title: "React Components & Hooks",
        description: "Test your knowledge of React components and hooks",
        questions: &[
            (
                "What is JSX?",
                &["JavaScript XML", "Java Syntax Extension", "JSON XML", "JavaScript Extension"],
                "JavaScript XML",
            ),
            (
                "Which hook is used for side effects in React?",
                &["useEffect", "useState", "useContext", "useReducer"],
                "useEffect",
            ),
        ],
        time_limit: 25,
        passing_score: 75,
    },
    SampleQuiz {
        course_id: "python",
        title: "Python Basics",
        description: "Test your knowledge of Python fundamentals",
        questions: &[
            (
                "What is the correct file extension for Python files?",
                &[".py", ".python", ".pt", ".pyt"],
                ".py",
            ),
            (
                "Which of the following is used to define a function in Python?",
                &["def", "function", "func", "define"],
                "def",
            ),
        ],
        time_limit: 15,
        passing_score: 80,
    },
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub courses: usize,
    pub assignments: usize,
    pub quizzes: usize,
    pub sample_quizzes: usize,
}

impl SampleQuiz {
    fn to_questions(&self) -> Vec<QuizQuestion> {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, (question, options, answer))| QuizQuestion {
                id: format!("q{}", index + 1),
                question: question.to_string(),
                options: options.iter().map(|o| o.to_string()).collect(),
                correct_answer: answer.to_string(),
            })
            .collect()
    }
}

/// Inserts the static course catalog plus sample coursework. Safe to rerun:
/// existing rows are left untouched.
pub async fn seed_catalog(db: &DatabaseProxy) -> Result<SeedReport, ServiceError> {
    let now = Utc::now();
    let mut report = SeedReport::default();

    let mut tx = db.begin().await?;

    for entry in CATALOG {
        if course::insert_course_if_missing(&mut *tx, entry, now).await? {
            report.courses += 1;
        }
    }

    for sample in SAMPLE_ASSIGNMENTS {
        let new_assignment = NewAssignment {
            course_id: sample.course_id,
            title: sample.title,
            description: sample.description,
            instructions: sample.instructions,
            due_date: now + Duration::days(sample.due_in_days),
            max_score: 100,
        };
        if assignment::insert_assignment_if_missing(&mut *tx, &new_assignment, now).await? {
            report.assignments += 1;
        }
    }

    for sample in SAMPLE_QUIZZES {
        let new_quiz = NewQuiz {
            course_id: sample.course_id,
            title: sample.title,
            description: sample.description,
            questions: sample.to_questions(),
            time_limit: sample.time_limit,
            max_attempts: 3,
            passing_score: sample.passing_score,
        };
        if quiz::insert_quiz_if_missing(&mut *tx, &new_quiz, now)
            .await?
            .is_some()
        {
            report.quizzes += 1;
        }
    }

    tx.commit().await?;

    report.sample_quizzes = assessment::ensure_sample_quizzes(db).await?;

    tracing::info!(
        courses = report.courses,
        assignments = report.assignments,
        quizzes = report.quizzes,
        sample_quizzes = report.sample_quizzes,
        "catalog seeded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        let mut ids: Vec<_> = CATALOG.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), CATALOG.len());
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn sample_coursework_points_at_catalog_courses() {
        let known = |id: &str| CATALOG.iter().any(|c| c.id == id);
        assert!(SAMPLE_ASSIGNMENTS.iter().all(|a| known(a.course_id)));
        assert!(SAMPLE_QUIZZES.iter().all(|q| known(q.course_id)));
    }

    #[test]
    fn sample_quiz_answers_are_among_options() {
        for sample in SAMPLE_QUIZZES {
            for question in sample.to_questions() {
                assert!(question.options.contains(&question.correct_answer), "{}", question.question);
            }
        }
    }
}
