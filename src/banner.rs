use console::{measure_text_width, style};
use std::iter;

use crate::transfer::TransferRequest;

/// Prints the transfer summary framed in a blue box.
///
/// # Examples
///
/// ```no_run
/// use git_transfer::banner::print_summary;
/// use git_transfer::filters::Author;
/// use git_transfer::transfer::TransferRequest;
///
/// let request = TransferRequest {
///     old_url: "https://github.com/acme/widgets.git".to_string(),
///     new_url: "https://github.com/newco/widgets.git".to_string(),
///     author: Author {
///         name: "Jane Doe".to_string(),
///         email: "jane@example.com".to_string(),
///     },
///     date_range: None,
///     replacements: Vec::new(),
/// };
/// print_summary(&request);
/// ```
pub fn print_summary(request: &TransferRequest) {
    println!();
    for row in framed(&summary_lines(request)) {
        println!("{row}");
    }
    println!();
}

/// Frames `lines` with box-drawing borders, one output row per line plus the
/// top and bottom edges.
///
/// Rows are padded to the widest visible line, so ANSI codes inside `lines`
/// do not skew the right border.
fn framed(lines: &[String]) -> Vec<String> {
    // one space of margin on each side
    let inner = lines
        .iter()
        .map(|l| measure_text_width(l))
        .max()
        .unwrap_or(0)
        + 2;

    let edge = |left: char, right: char| {
        style(format!("{left}{}{right}", "═".repeat(inner)))
            .blue()
            .bold()
            .to_string()
    };
    let bar = style("║").blue().bold().to_string();

    let body = lines.iter().map(|line| {
        let pad = inner - 1 - measure_text_width(line);
        format!("{bar} {line}{}{bar}", " ".repeat(pad))
    });

    iter::once(edge('╔', '╗'))
        .chain(body)
        .chain(iter::once(edge('╚', '╝')))
        .collect()
}

/// Lines of the summary box: title, repositories and author, then the
/// optional date range and replacement count, then a warning.
///
/// The warning line carries ANSI styling; measure visible width rather than
/// `str::len()`.
fn summary_lines(request: &TransferRequest) -> Vec<String> {
    let top = ["TRANSFER SUMMARY", ""].into_iter().map(|s| s.to_string());

    let details = [
        format!("Old repository: {}", request.old_url),
        format!("New repository: {}", request.new_url),
        format!("New author: {}", request.author),
    ]
    .into_iter()
    .chain(
        request
            .date_range
            .map(|range| format!("Date range: {range}")),
    )
    .chain((!request.replacements.is_empty()).then(|| {
        format!(
            "Message replacements: {} replacement(s)",
            request.replacements.len()
        )
    }));

    let warning = iter::once(String::new()).chain(iter::once(
        style("All history will be rewritten and force-mirrored to the new repository.")
            .yellow()
            .bold()
            .to_string(),
    ));

    top.chain(details).chain(warning).collect()
}
