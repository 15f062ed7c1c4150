// c0front: single-pass C0 compiler with a listing viewer

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use c0front::analyser::{
    compile_program, compile_program_from, compile_statements, compile_statements_from,
};
use c0front::parser::lexer::Lexer;
use c0front::parser::source::ReaderSource;
use c0front::ui::App;

/// Command-line options
struct Options {
    path: String,
    statements: bool,
    tokens: bool,
    view: bool,
}

fn usage(program_name: &str) {
    eprintln!("Usage: {} <file.c0> [--statements] [--tokens] [--view]", program_name);
    eprintln!();
    eprintln!("  --statements   compile the file as a statement sequence");
    eprintln!("  --tokens       print the token stream instead of compiling");
    eprintln!("  --view         browse the source and listing in a terminal UI");
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut path = None;
    let mut options = Options {
        path: String::new(),
        statements: false,
        tokens: false,
        view: false,
    };

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--statements" => options.statements = true,
            "--tokens" => options.tokens = true,
            "--view" => options.view = true,
            flag if flag.starts_with("--") => return Err(format!("Unknown option '{}'", flag)),
            file if path.is_none() => path = Some(file.to_string()),
            extra => return Err(format!("Unexpected argument '{}'", extra)),
        }
    }

    options.path = path.ok_or_else(|| "No input file provided".to_string())?;
    Ok(options)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(|s| s.as_str()).unwrap_or("c0front");

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {}", message);
            eprintln!();
            usage(program_name);
            std::process::exit(1);
        }
    };

    if !Path::new(&options.path).exists() {
        eprintln!("Error: File '{}' not found", options.path);
        usage(program_name);
        std::process::exit(1);
    }

    if options.tokens {
        return print_tokens(&options.path);
    }

    if options.view {
        return run_viewer(&options);
    }

    eprintln!("Compiling {}...", options.path);
    let source = ReaderSource::new(BufReader::new(File::open(&options.path)?));
    let result = if options.statements {
        compile_statements_from(source)
    } else {
        compile_program_from(source)
    };

    match result {
        Ok(program) => {
            eprintln!(
                "Compiled successfully. Emitted {} instructions.",
                program.len()
            );
            print!("{}", program);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn print_tokens(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Tokenizing {}...", path);
    let mut lexer = Lexer::new(ReaderSource::new(BufReader::new(File::open(path)?)));
    match lexer.tokenize() {
        Ok(tokens) => {
            for token in &tokens {
                println!("{:>4}:{:<4} {}", token.start.line, token.start.column, token);
            }
            eprintln!("Tokenized successfully. Found {} tokens.", tokens.len());
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn run_viewer(options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(&options.path)?;

    eprintln!("Compiling {}...", options.path);
    let result = if options.statements {
        compile_statements(&source)
    } else {
        compile_program(&source)
    };
    match &result {
        Ok(program) => eprintln!(
            "Compiled successfully. Emitted {} instructions.",
            program.len()
        ),
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Entering viewer with the error location...");
        }
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(source, result);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
