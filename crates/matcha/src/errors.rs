//! Error handling and exit codes.

use matcha_core::calculator::CalcError;
use matcha_core::constants::exit_codes;
use matcha_plot::PlotError;

/// Exit code of a calculation error.
pub fn calc_exit_code(err: &CalcError) -> i32 {
    match err {
        CalcError::InvalidParameter(_) | CalcError::InvalidRequest(_) | CalcError::Config(_) => {
            exit_codes::ERROR_CONFIG
        }
        CalcError::Numerical(_) => exit_codes::ERROR_GENERIC,
        CalcError::Cancelled => exit_codes::ERROR_CANCELED,
    }
}

/// Exit code for an application error, looking through any added context.
pub fn handle_error(err: &anyhow::Error) -> i32 {
    if let Some(calc) = err.downcast_ref::<CalcError>() {
        calc_exit_code(calc)
    } else if err.downcast_ref::<PlotError>().is_some() {
        exit_codes::ERROR_PLOT
    } else {
        exit_codes::ERROR_GENERIC
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn error_codes() {
        assert_eq!(calc_exit_code(&CalcError::Cancelled), 130);
        assert_eq!(calc_exit_code(&CalcError::InvalidRequest("samples".into())), 4);
        assert_eq!(calc_exit_code(&CalcError::Config("model".into())), 4);
        assert_eq!(calc_exit_code(&CalcError::Numerical("bracket".into())), 1);
    }

    #[test]
    fn plot_errors() {
        let err = anyhow::Error::new(PlotError::UnknownColormap("nope".into()));
        assert_eq!(handle_error(&err), exit_codes::ERROR_PLOT);
    }

    #[test]
    fn context_is_transparent() {
        let err: anyhow::Result<()> = Err(CalcError::InvalidParameter("h_0".into()))
            .context("reading run file");
        assert_eq!(handle_error(&err.unwrap_err()), exit_codes::ERROR_CONFIG);
    }

    #[test]
    fn other_errors_are_generic() {
        let err = anyhow::anyhow!("TUI error");
        assert_eq!(handle_error(&err), exit_codes::ERROR_GENERIC);
    }
}
