use colored::{Color, ColoredString, Colorize};
use crossterm::terminal;
use sjudge_core::testing::{JudgeCode, SampleRunResult};

#[macro_export]
macro_rules! print_success {
    ($fmt:literal, $($e:tt)*) => {{
        use ::colored::Colorize as _;
        println!("{}", format!($fmt, $($e)*).green())
    }}
}

pub fn is_truecolor_supported() -> bool {
    let Ok(v) = std::env::var("COLORTERM") else {
        return false
    };
    matches!(v.as_str(), "truecolor" | "24bit")
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for log::Level {
    fn color(&self) -> Color {
        use log::Level::*;
        match self {
            Error => Color::BrightRed,
            Warn => Color::BrightYellow,
            Info => Color::Cyan,
            Debug => Color::Magenta,
            Trace => Color::Blue,
        }
    }
}

impl ColorTheme for JudgeCode {
    fn color(&self) -> Color {
        use JudgeCode::*;
        if !self::is_truecolor_supported() {
            return match self {
                Pass => Color::Green,
                Fail => Color::Yellow,
                Tle => Color::Red,
                Run => Color::Blue,
                Running | Pending | Cancelled => Color::BrightBlack,
            };
        }

        match self {
            Pass => Color::TrueColor {
                r: 30,
                g: 180,
                b: 40,
            },
            Fail => Color::TrueColor {
                r: 210,
                g: 138,
                b: 4,
            },
            Tle => Color::TrueColor {
                r: 220,
                g: 42,
                b: 42,
            },
            Run => Color::TrueColor {
                r: 40,
                g: 110,
                b: 210,
            },
            Running | Pending | Cancelled => Color::TrueColor {
                r: 110,
                g: 110,
                b: 110,
            },
        }
    }
}

pub fn judge_icon(judge: JudgeCode) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {} ", judge)
        .on_color(judge.color())
        .bold()
        .color(fg)
}

pub fn summary_line(passed: usize, judged: usize) -> String {
    let bar = "-".repeat(5);
    let msg = if judged == 0 {
        "No judged testcases".normal()
    } else if passed == judged {
        format!("All {} tests passed ✨", judged).green()
    } else if passed > 0 {
        format!("{}/{} tests failed 💣", judged - passed, judged).bright_red()
    } else {
        format!("All {} tests failed 💀", judged).bright_red()
    };
    format!("{} {} {}", bar, msg, bar)
}

pub fn print_result_detail(title: &str, judge: JudgeCode, res: &SampleRunResult) {
    let (cols, _) = terminal::size().unwrap_or((40, 40));
    let cols = cols as usize;

    const BOLD_LINE: &str = "━";
    const THIN_LINE: &str = "─";

    println!(
        "\n{}: {} [{}ms]\n{}",
        title.color(Color::BrightYellow).bold(),
        self::judge_icon(judge),
        res.elapsed_ms,
        BOLD_LINE.repeat(cols).blue().bold(),
    );

    fn print_sub_title(s: &str, cols: usize) {
        println!(
            "{}{}",
            s.cyan().bold(),
            THIN_LINE
                .repeat(cols.saturating_sub(s.len() + 1))
                .bright_black(),
        )
    }

    fn print_lines(text: &str) {
        if text.is_empty() {
            println!("{}", "<EMPTY>".magenta().dimmed());
            return;
        }
        for line in text.lines() {
            let trimmed = line.trim_end();
            print!("{}", trimmed);
            let num_trailing_whitespace = line.len() - trimmed.len();
            if num_trailing_whitespace > 0 {
                print!("{}", " ".repeat(num_trailing_whitespace).on_red());
            }
            println!();
        }
    }

    if let Some(code) = res.exit_code.filter(|&c| c != 0) {
        println!("{} {}", "exit code:".red().bold(), code);
    }
    if res.timed_out {
        println!("{}", "Time limit exceeded (killed)".red().bold());
    }

    print_sub_title("[expected]", cols);
    print_lines(&res.expected_output);

    print_sub_title("[stdout]", cols);
    print_lines(&res.actual_output);

    if !res.standard_error.is_empty() {
        print_sub_title("[stderr]", cols);
        print_lines(&res.standard_error);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn summary_mentions_counts() {
        colored::control::set_override(false);
        assert_eq!(summary_line(2, 2), "----- All 2 tests passed ✨ -----");
        assert_eq!(summary_line(1, 3), "----- 2/3 tests failed 💣 -----");
        assert_eq!(summary_line(0, 3), "----- All 3 tests failed 💀 -----");
        assert_eq!(summary_line(0, 0), "----- No judged testcases -----");
    }
}
