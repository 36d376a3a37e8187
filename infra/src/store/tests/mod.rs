mod fallback_tests;
