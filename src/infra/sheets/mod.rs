pub mod http_sheet_service;
